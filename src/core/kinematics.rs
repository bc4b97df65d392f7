//! Frame-to-frame kinematics.
//!
//! Distances are taken between consecutive frames of one landmark. The final
//! frame column is not used, and the first output column has no predecessor,
//! so every output row has one fewer column than the input and starts with a
//! missing cell.

use crate::error::{MetricsError, Result};
use crate::table::{Cell, FrameTable, TableRow};
use rayon::prelude::*;

/// Euclidean displacement between consecutive frames.
///
/// Output column `j` holds the distance between input frames `j - 1` and `j`
/// for `j` in `1..n-1`; column 0 is always missing. A distance is missing
/// whenever either of its deltas is missing.
pub fn distance(x: &FrameTable, y: &FrameTable) -> Result<FrameTable> {
    x.ensure_same_shape(y)?;

    let width = x.frame_count().saturating_sub(1);
    let schema = x.schema().slice_frames(0..width);

    let rows: Vec<TableRow> = x
        .rows()
        .par_iter()
        .zip(y.rows().par_iter())
        .map(|(rx, ry)| {
            TableRow::new(
                rx.identifiers.clone(),
                step_lengths(&rx.values[..width], &ry.values[..width]),
            )
        })
        .collect();

    Ok(x.derived(format!("{}_distance", x.name()), schema, rows))
}

/// Speed between consecutive frames, in distance units per second.
///
/// `exposure_time` is the duration of one frame in seconds.
pub fn velocity(x: &FrameTable, y: &FrameTable, exposure_time: f64) -> Result<FrameTable> {
    validate_time_step("exposure_time_secs", exposure_time)?;

    let steps = distance(x, y)?;
    Ok(steps
        .map_cells(|d| d.map(|d| d / exposure_time))
        .renamed(format!("{}_velocity", x.name())))
}

/// Cellwise midpoint of two landmarks along one axis.
///
/// The midpoint is missing if either landmark is missing at that cell.
pub fn center_of_mass(a: &FrameTable, b: &FrameTable) -> Result<FrameTable> {
    a.ensure_same_shape(b)?;

    let rows: Vec<TableRow> = a
        .rows()
        .par_iter()
        .zip(b.rows().par_iter())
        .map(|(ra, rb)| {
            let values = ra
                .values
                .iter()
                .zip(&rb.values)
                .map(|(&va, &vb)| Some((va? + vb?) / 2.0))
                .collect();
            TableRow::new(ra.identifiers.clone(), values)
        })
        .collect();

    Ok(a.derived(format!("{}_com", a.name()), a.schema().clone(), rows))
}

pub(crate) fn validate_time_step(parameter: &'static str, dt: f64) -> Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(MetricsError::config(
            parameter,
            dt,
            "must be a positive number of seconds",
        ));
    }
    Ok(())
}

fn step_lengths(xs: &[Cell], ys: &[Cell]) -> Vec<Cell> {
    let mut out = Vec::with_capacity(xs.len());
    if xs.is_empty() {
        return out;
    }

    out.push(None);
    for j in 1..xs.len() {
        let dx = delta(xs[j - 1], xs[j]);
        let dy = delta(ys[j - 1], ys[j]);
        out.push(match (dx, dy) {
            (Some(dx), Some(dy)) => Some(dx.hypot(dy)),
            _ => None,
        });
    }
    out
}

fn delta(previous: Cell, current: Cell) -> Cell {
    Some(current? - previous?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::scale;

    fn table(name: &str, values: Vec<Vec<Cell>>) -> FrameTable {
        FrameTable::from_values(name, values).unwrap()
    }

    #[test]
    fn test_distance_shape_and_values() {
        let x = table("x", vec![vec![Some(0.0), Some(3.0), Some(3.0), Some(100.0)]]);
        let y = table("y", vec![vec![Some(0.0), Some(4.0), Some(4.0), Some(100.0)]]);

        let d = distance(&x, &y).unwrap();
        assert_eq!(d.frame_count(), 3);
        // last frame excluded, first column has no predecessor
        assert_eq!(d.rows()[0].values, vec![None, Some(5.0), Some(0.0)]);
    }

    #[test]
    fn test_distance_missing_delta() {
        let x = table("x", vec![vec![Some(0.0), None, Some(1.0), Some(2.0), Some(0.0)]]);
        let y = table("y", vec![vec![Some(0.0), Some(1.0), Some(1.0), Some(1.0), Some(0.0)]]);

        let d = distance(&x, &y).unwrap();
        assert_eq!(d.rows()[0].values, vec![None, None, None, Some(1.0)]);
    }

    #[test]
    fn test_distance_non_negative() {
        let x = table(
            "x",
            vec![vec![Some(5.0), Some(-2.0), Some(7.5), Some(-1.0), Some(0.0)]],
        );
        let y = table(
            "y",
            vec![vec![Some(-3.0), Some(4.0), Some(-8.0), Some(2.0), Some(0.0)]],
        );

        let d = distance(&x, &y).unwrap();
        assert!(d.rows()[0].values.iter().flatten().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_velocity_divides_by_exposure_time() {
        let x = table("x", vec![vec![Some(0.0), Some(3.0), Some(0.0)]]);
        let y = table("y", vec![vec![Some(0.0), Some(4.0), Some(0.0)]]);

        let v = velocity(&x, &y, 0.5).unwrap();
        assert_eq!(v.rows()[0].values, vec![None, Some(10.0)]);
        assert_eq!(v.name(), "x_velocity");
    }

    #[test]
    fn test_velocity_rejects_bad_exposure_time() {
        let x = table("x", vec![vec![Some(0.0); 3]]);
        assert!(velocity(&x, &x, 0.0).unwrap_err().is_configuration());
        assert!(velocity(&x, &x, -1.0).unwrap_err().is_configuration());
    }

    #[test]
    fn test_scaling_round_trip() {
        let k = 25.0;
        let x = table("x", vec![vec![Some(1.3), Some(2.9), Some(-0.4), Some(5.5), Some(0.1)]]);
        let y = table("y", vec![vec![Some(0.7), Some(-1.1), Some(3.3), Some(2.2), Some(9.0)]]);

        let plain = distance(&x, &y).unwrap();
        let scaled = distance(&scale(&x, k), &scale(&y, k)).unwrap();

        for (a, b) in plain.rows()[0].values.iter().zip(&scaled.rows()[0].values) {
            match (a, b) {
                (Some(a), Some(b)) => assert!((a - b / k).abs() < 1e-9),
                (None, None) => {}
                _ => panic!("missing pattern changed under scaling"),
            }
        }
    }

    #[test]
    fn test_center_of_mass() {
        let a = table("a", vec![vec![Some(2.0), None, Some(4.0)]]);
        let b = table("b", vec![vec![Some(4.0), Some(1.0), None]]);

        let com = center_of_mass(&a, &b).unwrap();
        assert_eq!(com.rows()[0].values, vec![Some(3.0), None, None]);
    }
}
