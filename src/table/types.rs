//! Frame-indexed tables with explicit column roles.
//!
//! A table row is one trajectory instance (an individual within an
//! experiment). Its leading identifier columns are strings; its frame
//! columns are optional numbers where `None` marks a missing measurement.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single per-frame measurement. `None` means "not measured".
pub type Cell = Option<f64>;

/// Role of a column within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Categorical identifier (experiment, stimulus strength, individual)
    Identifier,
    /// Numeric per-frame value
    Frame,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRole::Identifier => write!(f, "identifier"),
            ColumnRole::Frame => write!(f, "frame"),
        }
    }
}

/// Ordered column layout shared by every row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Identifier column names, in order
    pub identifiers: Vec<String>,
    /// Frame column labels, in time order
    pub frames: Vec<String>,
}

impl TableSchema {
    /// Create a schema from identifier names and frame labels.
    pub fn new(identifiers: Vec<String>, frames: Vec<String>) -> Self {
        Self {
            identifiers,
            frames,
        }
    }

    /// Schema with the given identifiers and `frame_count` frames labelled `0..n`.
    pub fn with_frame_count(identifiers: Vec<String>, frame_count: usize) -> Self {
        Self {
            identifiers,
            frames: (0..frame_count).map(|i| i.to_string()).collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of columns with the given role.
    pub fn width(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::Identifier => self.identifiers.len(),
            ColumnRole::Frame => self.frames.len(),
        }
    }

    /// Copy of this schema restricted to a range of frames.
    pub fn slice_frames(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            identifiers: self.identifiers.clone(),
            frames: self.frames[range].to_vec(),
        }
    }
}

/// One trajectory instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Identifier values, aligned with `TableSchema::identifiers`
    pub identifiers: Vec<String>,
    /// Frame cells, aligned with `TableSchema::frames`
    pub values: Vec<Cell>,
}

impl TableRow {
    pub fn new(identifiers: Vec<String>, values: Vec<Cell>) -> Self {
        Self {
            identifiers,
            values,
        }
    }

    /// Number of present cells.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Whether every frame cell is missing.
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Serialized form of a table before validation.
#[derive(Debug, Deserialize)]
struct RawFrameTable {
    name: String,
    schema: TableSchema,
    rows: Vec<TableRow>,
}

/// A named, schema-validated table of per-frame values.
///
/// Every row has exactly as many identifiers and frame cells as the schema
/// declares, and no present cell is non-finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrameTable")]
pub struct FrameTable {
    name: String,
    schema: TableSchema,
    rows: Vec<TableRow>,
}

/// Raw landmark coordinates for one axis.
pub type CoordinateTable = FrameTable;

/// A table of values derived per frame or per frame pair.
pub type DerivedMetricTable = FrameTable;

impl TryFrom<RawFrameTable> for FrameTable {
    type Error = MetricsError;

    fn try_from(raw: RawFrameTable) -> Result<Self> {
        FrameTable::new(raw.name, raw.schema, raw.rows)
    }
}

impl FrameTable {
    /// Create a table, validating row widths and normalizing non-finite cells to missing.
    pub fn new(name: impl Into<String>, schema: TableSchema, rows: Vec<TableRow>) -> Result<Self> {
        let name = name.into();

        let mut rows = rows;
        for (index, row) in rows.iter_mut().enumerate() {
            let widths = [
                (ColumnRole::Identifier, row.identifiers.len()),
                (ColumnRole::Frame, row.values.len()),
            ];
            for (role, found) in widths {
                let expected = schema.width(role);
                if found != expected {
                    return Err(MetricsError::MalformedRow {
                        table: name,
                        row: index,
                        kind: role,
                        expected,
                        found,
                    });
                }
            }
            for cell in row.values.iter_mut() {
                if matches!(cell, Some(v) if !v.is_finite()) {
                    *cell = None;
                }
            }
        }

        Ok(Self { name, schema, rows })
    }

    /// Convenience constructor for tables without identifier columns.
    pub fn from_values(name: impl Into<String>, values: Vec<Vec<Cell>>) -> Result<Self> {
        let frame_count = values.first().map_or(0, Vec::len);
        let schema = TableSchema::with_frame_count(Vec::new(), frame_count);
        let rows = values
            .into_iter()
            .map(|v| TableRow::new(Vec::new(), v))
            .collect();
        Self::new(name, schema, rows)
    }

    /// Build a derived table that inherits identifiers from `self`.
    ///
    /// The caller guarantees that `rows` match `schema`; used by engine
    /// operations whose output widths follow from the input shape.
    pub(crate) fn derived(&self, name: impl Into<String>, schema: TableSchema, rows: Vec<TableRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == schema.frame_count()));
        Self {
            name: name.into(),
            schema,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same table under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn frame_count(&self) -> usize {
        self.schema.frame_count()
    }

    /// (rows, frames)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.frame_count())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at (row, frame), `None` when missing or out of range.
    pub fn get(&self, row: usize, frame: usize) -> Cell {
        self.rows.get(row).and_then(|r| r.values.get(frame).copied().flatten())
    }

    /// Total number of frame cells.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.frame_count()
    }

    /// Number of missing frame cells.
    pub fn missing_count(&self) -> usize {
        self.cell_count() - self.rows.iter().map(TableRow::present_count).sum::<usize>()
    }

    /// Fail with `ShapeMismatch` unless `other` has the same shape.
    pub fn ensure_same_shape(&self, other: &FrameTable) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MetricsError::ShapeMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
                left_shape: self.shape(),
                right_shape: other.shape(),
            });
        }
        Ok(())
    }

    /// Apply `f` to every frame cell, keeping identifiers and schema.
    pub fn map_cells<F>(&self, f: F) -> FrameTable
    where
        F: Fn(Cell) -> Cell,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| TableRow {
                identifiers: row.identifiers.clone(),
                values: row.values.iter().map(|&v| f(v)).collect(),
            })
            .collect();
        self.derived(self.name.clone(), self.schema.clone(), rows)
    }

    /// Split the table into groups of rows sharing identical identifier values.
    ///
    /// Groups keep the order in which their identifiers first appear.
    pub fn group_by_identifiers(&self) -> Vec<FrameTable> {
        let mut index: HashMap<&[String], usize> = HashMap::new();
        let mut groups: Vec<Vec<TableRow>> = Vec::new();

        for row in &self.rows {
            let slot = *index.entry(row.identifiers.as_slice()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row.clone());
        }

        groups
            .into_iter()
            .map(|rows| self.derived(self.name.clone(), self.schema.clone(), rows))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_rejects_short_row() {
        let schema = TableSchema::with_frame_count(ids(&["experiment"]), 3);
        let rows = vec![TableRow::new(ids(&["e1"]), vec![Some(1.0), None])];

        let err = FrameTable::new("x", schema, rows).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::MalformedRow {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_new_normalizes_non_finite_cells() {
        let table =
            FrameTable::from_values("x", vec![vec![Some(f64::NAN), Some(1.0), Some(f64::INFINITY)]])
                .unwrap();
        assert_eq!(table.rows()[0].values, vec![None, Some(1.0), None]);
        assert_eq!(table.missing_count(), 2);
    }

    #[test]
    fn test_malformed_row_names_column_role() {
        let schema = TableSchema::with_frame_count(ids(&["experiment", "stimulus"]), 2);
        assert_eq!(schema.width(ColumnRole::Identifier), 2);
        assert_eq!(schema.width(ColumnRole::Frame), 2);

        let rows = vec![TableRow::new(ids(&["e1"]), vec![Some(1.0), Some(2.0)])];
        let err = FrameTable::new("palp_x", schema, rows).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::MalformedRow {
                kind: ColumnRole::Identifier,
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "malformed row 0 in `palp_x`: expected 2 identifier cells, found 1"
        );
    }

    #[test]
    fn test_ensure_same_shape() {
        let a = FrameTable::from_values("a", vec![vec![Some(1.0); 4]; 2]).unwrap();
        let b = FrameTable::from_values("b", vec![vec![Some(1.0); 3]; 2]).unwrap();
        assert!(a.ensure_same_shape(&a.clone()).is_ok());
        assert!(matches!(
            a.ensure_same_shape(&b),
            Err(MetricsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_group_by_identifiers_keeps_first_appearance_order() {
        let schema = TableSchema::with_frame_count(ids(&["experiment"]), 1);
        let rows = vec![
            TableRow::new(ids(&["b"]), vec![Some(1.0)]),
            TableRow::new(ids(&["a"]), vec![Some(2.0)]),
            TableRow::new(ids(&["b"]), vec![Some(3.0)]),
        ];
        let table = FrameTable::new("angles", schema, rows).unwrap();

        let groups = table.group_by_identifiers();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].row_count(), 2);
        assert_eq!(groups[0].rows()[0].identifiers, ids(&["b"]));
        assert_eq!(groups[1].get(0, 0), Some(2.0));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "name": "x",
            "schema": { "identifiers": [], "frames": ["0", "1"] },
            "rows": [ { "identifiers": [], "values": [1.0] } ]
        }"#;
        assert!(serde_json::from_str::<FrameTable>(json).is_err());

        let json = r#"{
            "name": "x",
            "schema": { "identifiers": [], "frames": ["0", "1"] },
            "rows": [ { "identifiers": [], "values": [1.0, null] } ]
        }"#;
        let table: FrameTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.get(0, 1), None);
    }
}
