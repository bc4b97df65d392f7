//! Removal of short tracking fragments.
//!
//! A fragment is a maximal run of consecutive present cells in a row.
//! Fragments shorter than the minimum length are typically tracker
//! glitches and would inject spurious jumps into frame differences.

use crate::error::{MetricsError, Result};
use crate::table::{Cell, FrameTable, TableRow};
use rayon::prelude::*;

/// Default minimum fragment length in frames.
pub const DEFAULT_MIN_FRAGMENT_LEN: usize = 10;

/// Keep only cells that belong to a fragment of at least `min_len` frames.
///
/// Rows are independent and are filtered in parallel.
pub fn filter_fragments(table: &FrameTable, min_len: usize) -> Result<FrameTable> {
    if min_len == 0 {
        return Err(MetricsError::config(
            "min_fragment_len",
            min_len,
            "must be at least 1",
        ));
    }

    let rows: Vec<TableRow> = table
        .rows()
        .par_iter()
        .map(|row| TableRow::new(row.identifiers.clone(), filter_row(&row.values, min_len)))
        .collect();

    Ok(table.derived(table.name(), table.schema().clone(), rows))
}

/// Lengths of the fragments in a row, in order.
pub fn fragment_lengths(values: &[Cell]) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut run = 0;
    for value in values {
        if value.is_some() {
            run += 1;
        } else if run > 0 {
            lengths.push(run);
            run = 0;
        }
    }
    if run > 0 {
        lengths.push(run);
    }
    lengths
}

fn filter_row(values: &[Cell], min_len: usize) -> Vec<Cell> {
    let mut out = vec![None; values.len()];
    let mut start = 0;

    while start < values.len() {
        if values[start].is_none() {
            start += 1;
            continue;
        }

        let end = values[start..]
            .iter()
            .position(Option::is_none)
            .map_or(values.len(), |offset| start + offset);

        if end - start >= min_len {
            out[start..end].copy_from_slice(&values[start..end]);
        }
        start = end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(len: usize, padding: usize) -> Vec<Cell> {
        let mut values = vec![None; padding];
        values.extend((0..len).map(|i| Some(i as f64 + 1.0)));
        values.extend(vec![None; padding]);
        values
    }

    #[test]
    fn test_run_shorter_than_minimum_is_removed() {
        let table = FrameTable::from_values("x", vec![run(9, 2)]).unwrap();
        let filtered = filter_fragments(&table, 10).unwrap();
        assert!(filtered.rows()[0].is_all_missing());
    }

    #[test]
    fn test_run_of_exact_minimum_is_kept() {
        let table = FrameTable::from_values("x", vec![run(10, 2)]).unwrap();
        let filtered = filter_fragments(&table, 10).unwrap();
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_mixed_fragments() {
        let values = vec![
            Some(1.0),
            Some(2.0),
            None,
            Some(3.0),
            Some(4.0),
            Some(5.0),
            None,
            Some(6.0),
        ];
        let table = FrameTable::from_values("x", vec![values]).unwrap();
        let filtered = filter_fragments(&table, 3).unwrap();
        assert_eq!(
            filtered.rows()[0].values,
            vec![None, None, None, Some(3.0), Some(4.0), Some(5.0), None, None]
        );
    }

    #[test]
    fn test_all_missing_row_unchanged() {
        let table = FrameTable::from_values("x", vec![vec![None; 6]]).unwrap();
        assert_eq!(filter_fragments(&table, 10).unwrap(), table);
    }

    #[test]
    fn test_zero_min_len_rejected() {
        let table = FrameTable::from_values("x", vec![vec![Some(1.0); 3]]).unwrap();
        assert!(filter_fragments(&table, 0).unwrap_err().is_configuration());
    }

    #[test]
    fn test_fragment_lengths() {
        assert_eq!(fragment_lengths(&run(4, 1)), vec![4]);
        assert_eq!(
            fragment_lengths(&[Some(1.0), None, Some(1.0), Some(1.0)]),
            vec![1, 2]
        );
        assert!(fragment_lengths(&[None, None]).is_empty());
    }
}
