//! Fixed, non-overlapping time windows over angle tables.
//!
//! For every window the engine reports how likely a tracked individual is to
//! hold a heading within an angular range. The probability of a single frame
//! column is the fraction of rows with a measurement that fall inside the
//! range; a window averages the probabilities of its columns.

use crate::error::{MetricsError, Result};
use crate::table::FrameTable;
use serde::{Deserialize, Serialize};

/// Inclusive angular range in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularRange {
    pub lower: f64,
    pub upper: f64,
}

impl AngularRange {
    /// Create a range from radian bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !(lower.is_finite() && upper.is_finite()) || lower > upper {
            return Err(MetricsError::config(
                "angular_range",
                format!("[{lower}, {upper}]"),
                "bounds must be finite with lower <= upper",
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Create a range from degree bounds, converting to radians.
    ///
    /// Angle tables produced by the engine are in radians; degree bounds
    /// must go through this constructor before use.
    pub fn from_degrees(lower_deg: f64, upper_deg: f64) -> Result<Self> {
        Self::new(lower_deg.to_radians(), upper_deg.to_radians())
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.lower && angle <= self.upper
    }
}

/// Per-window probabilities for one table (or one identifier group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowProbabilityRow {
    /// Identifier column names
    pub identifier_names: Vec<String>,
    /// Identifier values taken from the first row of the table
    pub identifiers: Vec<String>,
    /// Window size in frames
    pub window_frames: usize,
    /// One probability per window; `None` when the window had no measurements
    pub windows: Vec<Option<f64>>,
}

impl WindowProbabilityRow {
    /// Column labels `Window_0`, `Window_1`, ...
    pub fn window_labels(&self) -> Vec<String> {
        (0..self.windows.len()).map(|i| format!("Window_{i}")).collect()
    }

    /// Number of windows with a defined probability.
    pub fn defined_count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_some()).count()
    }
}

/// Number of complete windows of `window` frames; trailing frames are dropped.
pub fn window_count(frame_count: usize, window: usize) -> usize {
    if window == 0 {
        0
    } else {
        frame_count / window
    }
}

/// Probability of the heading lying in `range`, per window.
///
/// Identifier values are copied from the first row; callers that mix
/// identifiers in one table should use [`window_probability_by_group`].
pub fn window_probability(
    angles: &FrameTable,
    range: AngularRange,
    window: usize,
) -> Result<WindowProbabilityRow> {
    if window == 0 {
        return Err(MetricsError::config(
            "window_frames",
            window,
            "must be at least 1",
        ));
    }

    let windows = (0..window_count(angles.frame_count(), window))
        .map(|w| {
            let start = w * window;
            mean_defined((start..start + window).map(|f| column_fraction(angles, f, range)))
        })
        .collect();

    Ok(WindowProbabilityRow {
        identifier_names: angles.schema().identifiers.clone(),
        identifiers: angles
            .rows()
            .first()
            .map(|row| row.identifiers.clone())
            .unwrap_or_default(),
        window_frames: window,
        windows,
    })
}

/// Window probabilities computed separately for each identifier group.
pub fn window_probability_by_group(
    angles: &FrameTable,
    range: AngularRange,
    window: usize,
) -> Result<Vec<WindowProbabilityRow>> {
    angles
        .group_by_identifiers()
        .iter()
        .map(|group| window_probability(group, range, window))
        .collect()
}

/// Fraction of measured rows in `range` at one frame; `None` if nothing was measured.
fn column_fraction(angles: &FrameTable, frame: usize, range: AngularRange) -> Option<f64> {
    let (measured, inside) = angles
        .rows()
        .iter()
        .filter_map(|row| row.values[frame])
        .fold((0usize, 0usize), |(measured, inside), angle| {
            (measured + 1, inside + usize::from(range.contains(angle)))
        });

    if measured == 0 {
        None
    } else {
        Some(inside as f64 / measured as f64)
    }
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, TableRow, TableSchema};

    fn angles(values: Vec<Vec<Cell>>) -> FrameTable {
        FrameTable::from_values("angles", values).unwrap()
    }

    #[test]
    fn test_window_count_drops_remainder() {
        assert_eq!(window_count(10, 5), 2);
        assert_eq!(window_count(12, 5), 2);
        assert_eq!(window_count(4, 5), 0);
    }

    #[test]
    fn test_ten_frames_two_windows() {
        let table = angles(vec![vec![Some(0.5); 10]; 3]);
        let range = AngularRange::new(0.0, 1.0).unwrap();

        let row = window_probability(&table, range, 5).unwrap();
        assert_eq!(row.windows, vec![Some(1.0), Some(1.0)]);
        assert_eq!(row.window_labels(), vec!["Window_0", "Window_1"]);
    }

    #[test]
    fn test_missing_column_is_excluded_not_zeroed() {
        // column 0: 1 of 2 inside; column 1: all missing; column 2: 2 of 2 inside
        let table = angles(vec![
            vec![Some(0.5), None, Some(0.2)],
            vec![Some(3.0), None, Some(0.9)],
        ]);
        let range = AngularRange::new(0.0, 1.0).unwrap();

        let row = window_probability(&table, range, 3).unwrap();
        assert_eq!(row.windows.len(), 1);
        assert!((row.windows[0].unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_counts_only_measured_rows() {
        let table = angles(vec![vec![Some(0.5)], vec![None], vec![Some(2.0)], vec![Some(0.1)]]);
        let range = AngularRange::new(0.0, 1.0).unwrap();

        let row = window_probability(&table, range, 1).unwrap();
        assert!((row.windows[0].unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fully_missing_window_is_undefined() {
        let table = angles(vec![vec![None, None, Some(0.5), Some(0.5)]]);
        let range = AngularRange::new(0.0, 1.0).unwrap();

        let row = window_probability(&table, range, 2).unwrap();
        assert_eq!(row.windows, vec![None, Some(1.0)]);
        assert_eq!(row.defined_count(), 1);
    }

    #[test]
    fn test_bounds_are_inclusive_and_converted_from_degrees() {
        let range = AngularRange::from_degrees(0.0, 90.0).unwrap();
        assert!(range.contains(0.0));
        assert!(range.contains(std::f64::consts::FRAC_PI_2));
        assert!(!range.contains(std::f64::consts::PI));
        assert!(AngularRange::from_degrees(90.0, 0.0).is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let table = angles(vec![vec![Some(0.5); 4]]);
        let range = AngularRange::new(0.0, 1.0).unwrap();
        assert!(window_probability(&table, range, 0)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_identifiers_from_first_row_and_groups() {
        let schema = TableSchema::with_frame_count(vec!["experiment".to_string()], 2);
        let rows = vec![
            TableRow::new(vec!["e1".to_string()], vec![Some(0.5), Some(0.5)]),
            TableRow::new(vec!["e2".to_string()], vec![Some(3.0), Some(3.0)]),
        ];
        let table = FrameTable::new("angles", schema, rows).unwrap();
        let range = AngularRange::new(0.0, 1.0).unwrap();

        let pooled = window_probability(&table, range, 2).unwrap();
        assert_eq!(pooled.identifiers, vec!["e1".to_string()]);
        assert_eq!(pooled.windows, vec![Some(0.5)]);

        let grouped = window_probability_by_group(&table, range, 2).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].windows, vec![Some(1.0)]);
        assert_eq!(grouped[1].identifiers, vec!["e2".to_string()]);
        assert_eq!(grouped[1].windows, vec![Some(0.0)]);
    }
}
