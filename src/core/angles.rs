//! Heading angle and angular velocity.
//!
//! The heading of an animal is the direction from its posterior landmark to
//! its anterior landmark, measured as `atan2(dx, dy)`: zero points along +y
//! and angles grow towards +x. A fixed calibration offset is added and the
//! result is wrapped into `[0, 2π)`.
//!
//! Angular velocity is a plain difference of wrapped angles. It does not
//! unwrap across the 0/2π boundary, so a heading that crosses it produces a
//! jump of roughly ±2π/dt at that frame.

use crate::core::kinematics::validate_time_step;
use crate::error::Result;
use crate::table::{Cell, FrameTable, LandmarkTrack, TableRow};
use rayon::prelude::*;
use std::f64::consts::TAU;

/// Default calibration offset in radians.
pub const DEFAULT_ANGLE_OFFSET_RAD: f64 = 0.061;

/// Heading angle per (row, frame), in radians within `[0, 2π)`.
pub fn heading_angles(
    anterior: &LandmarkTrack,
    posterior: &LandmarkTrack,
    offset: f64,
) -> Result<FrameTable> {
    let reference = &anterior.x;
    reference.ensure_same_shape(&anterior.y)?;
    reference.ensure_same_shape(&posterior.x)?;
    reference.ensure_same_shape(&posterior.y)?;

    let rows: Vec<TableRow> = (0..reference.row_count())
        .into_par_iter()
        .map(|r| {
            let values = (0..reference.frame_count())
                .map(|f| {
                    let dx = anterior.x.get(r, f)? - posterior.x.get(r, f)?;
                    let dy = anterior.y.get(r, f)? - posterior.y.get(r, f)?;
                    Some(wrap_angle(dx.atan2(dy) + offset))
                })
                .collect();
            TableRow::new(reference.rows()[r].identifiers.clone(), values)
        })
        .collect();

    Ok(reference.derived("heading_angle", reference.schema().clone(), rows))
}

/// Angular velocity in radians per second.
///
/// Column `j` holds `(angle[j] - angle[j-1]) / dt`; column 0 is missing.
/// Rows in which no value could be computed are removed from the output.
pub fn angular_velocity(angles: &FrameTable, dt: f64) -> Result<FrameTable> {
    validate_time_step("dt", dt)?;

    let rows: Vec<TableRow> = angles
        .rows()
        .par_iter()
        .filter_map(|row| {
            let values = differences(&row.values, dt);
            if values.iter().all(Option::is_none) {
                None
            } else {
                Some(TableRow::new(row.identifiers.clone(), values))
            }
        })
        .collect();

    let dropped = angles.row_count() - rows.len();
    if dropped > 0 {
        tracing::debug!(
            table = angles.name(),
            dropped,
            "pruned rows without any angular velocity"
        );
    }

    Ok(angles.derived("angular_velocity", angles.schema().clone(), rows))
}

/// Wrap an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

fn differences(values: &[Cell], dt: f64) -> Vec<Cell> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(
        values
            .windows(2)
            .map(|pair| Some((pair[1]? - pair[0]?) / dt)),
    );
    out
}
