//! Missing-data alignment between paired tables.

use crate::error::Result;
use crate::table::{FrameTable, TableRow};

/// Make two tables share one missing pattern.
///
/// A cell is missing in both outputs if it is missing in either input;
/// otherwise both values are returned unchanged. Run this on every x/y pair
/// before differencing so that no delta mixes a present and a missing axis.
pub fn synchronize_missing(a: &FrameTable, b: &FrameTable) -> Result<(FrameTable, FrameTable)> {
    a.ensure_same_shape(b)?;

    let (rows_a, rows_b): (Vec<TableRow>, Vec<TableRow>) = a
        .rows()
        .iter()
        .zip(b.rows())
        .map(|(row_a, row_b)| {
            let (values_a, values_b) = row_a
                .values
                .iter()
                .zip(&row_b.values)
                .map(|(&va, &vb)| match (va, vb) {
                    (Some(va), Some(vb)) => (Some(va), Some(vb)),
                    _ => (None, None),
                })
                .unzip();
            (
                TableRow::new(row_a.identifiers.clone(), values_a),
                TableRow::new(row_b.identifiers.clone(), values_b),
            )
        })
        .unzip();

    Ok((
        a.derived(a.name(), a.schema().clone(), rows_a),
        b.derived(b.name(), b.schema().clone(), rows_b),
    ))
}

/// Treat exact zeros as missing.
///
/// Pose trackers write 0 for a landmark they lost; those cells must not be
/// mistaken for a position at the origin.
pub fn zeros_to_missing(table: &FrameTable) -> FrameTable {
    table.map_cells(|v| v.filter(|&v| v != 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;

    #[test]
    fn test_missing_in_either_is_missing_in_both() {
        let x = FrameTable::from_values("x", vec![vec![Some(1.0), None, Some(3.0), Some(4.0)]])
            .unwrap();
        let y = FrameTable::from_values("y", vec![vec![Some(5.0), Some(6.0), None, Some(8.0)]])
            .unwrap();

        let (sx, sy) = synchronize_missing(&x, &y).unwrap();
        assert_eq!(sx.rows()[0].values, vec![Some(1.0), None, None, Some(4.0)]);
        assert_eq!(sy.rows()[0].values, vec![Some(5.0), None, None, Some(8.0)]);
        assert_eq!(sx.name(), "x");
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let x = FrameTable::from_values("x", vec![vec![Some(1.0), None, Some(3.0)]; 3]).unwrap();
        let y = FrameTable::from_values("y", vec![vec![None, Some(2.0), Some(3.5)]; 3]).unwrap();

        let (once_x, once_y) = synchronize_missing(&x, &y).unwrap();
        let (twice_x, twice_y) = synchronize_missing(&once_x, &once_y).unwrap();
        assert_eq!(once_x, twice_x);
        assert_eq!(once_y, twice_y);
    }

    #[test]
    fn test_shape_mismatch() {
        let x = FrameTable::from_values("x", vec![vec![Some(1.0); 3]]).unwrap();
        let y = FrameTable::from_values("y", vec![vec![Some(1.0); 4]]).unwrap();
        assert!(matches!(
            synchronize_missing(&x, &y),
            Err(MetricsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_zeros_to_missing() {
        let x = FrameTable::from_values("x", vec![vec![Some(0.0), Some(-0.0), Some(0.5), None]])
            .unwrap();
        assert_eq!(
            zeros_to_missing(&x).rows()[0].values,
            vec![None, None, Some(0.5), None]
        );
    }
}
