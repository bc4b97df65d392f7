//! Calibration and plausibility filters.
//!
//! These operate on frame cells only; identifier columns pass through.

use crate::error::{MetricsError, Result};
use crate::table::{FrameTable, LandmarkTrack, TableRow, TableSchema};
use serde::{Deserialize, Serialize};

/// Default physical size of one pixel.
pub const DEFAULT_PIXEL_SIZE: f64 = 25.0;

/// Inclusive bounds on the anterior/posterior landmark separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for SeparationBounds {
    fn default() -> Self {
        Self {
            lower: 100.0,
            upper: 500.0,
        }
    }
}

impl SeparationBounds {
    pub fn validate(&self) -> Result<()> {
        if !(self.lower.is_finite() && self.upper.is_finite()) || self.lower > self.upper {
            return Err(MetricsError::config(
                "separation",
                format!("[{}, {}]", self.lower, self.upper),
                "bounds must be finite with lower <= upper",
            ));
        }
        Ok(())
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// Multiply every frame cell by `factor` (e.g. pixels to micrometres).
pub fn scale(table: &FrameTable, factor: f64) -> FrameTable {
    table.map_cells(|v| v.map(|v| v * factor))
}

/// Drop cells strictly below `threshold`; values at or above it are kept.
pub fn filter_below(table: &FrameTable, threshold: f64) -> FrameTable {
    table.map_cells(|v| v.filter(|&v| v >= threshold))
}

/// Drop coordinates outside the inclusive range `[min, max]` (arena edges).
pub fn bound_positions(table: &FrameTable, min: f64, max: f64) -> FrameTable {
    table.map_cells(|v| v.filter(|v| (min..=max).contains(v)))
}

/// Keep every `stride`-th frame, starting with the first.
pub fn subsample_frames(table: &FrameTable, stride: usize) -> Result<FrameTable> {
    if stride == 0 {
        return Err(MetricsError::config(
            "frame_stride",
            stride,
            "must be at least 1",
        ));
    }
    if stride == 1 {
        return Ok(table.clone());
    }

    let schema = TableSchema::new(
        table.schema().identifiers.clone(),
        table.schema().frames.iter().step_by(stride).cloned().collect(),
    );
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            TableRow::new(
                row.identifiers.clone(),
                row.values.iter().step_by(stride).copied().collect(),
            )
        })
        .collect();

    Ok(table.derived(table.name(), schema, rows))
}

/// Enforce a physically plausible distance between two landmarks.
///
/// For each (row, frame) the separation `sqrt(dx^2 + dy^2) * scale` must lie
/// within `bounds`; otherwise all four coordinates at that frame become
/// missing. A frame with any missing coordinate has no defined separation
/// and is nulled as well.
pub fn bound_separation(
    a: &LandmarkTrack,
    b: &LandmarkTrack,
    bounds: SeparationBounds,
    scale: f64,
) -> Result<(LandmarkTrack, LandmarkTrack)> {
    bounds.validate()?;
    a.x.ensure_same_shape(&a.y)?;
    a.x.ensure_same_shape(&b.x)?;
    a.x.ensure_same_shape(&b.y)?;

    let (rows, frames) = a.shape();
    let mut keep = vec![vec![false; frames]; rows];
    for (r, mask) in keep.iter_mut().enumerate() {
        for (f, slot) in mask.iter_mut().enumerate() {
            if let (Some(ax), Some(ay), Some(bx), Some(by)) =
                (a.x.get(r, f), a.y.get(r, f), b.x.get(r, f), b.y.get(r, f))
            {
                let separation = (ax - bx).hypot(ay - by) * scale;
                *slot = bounds.contains(separation);
            }
        }
    }

    let apply = |table: &FrameTable| -> FrameTable {
        let rows = table
            .rows()
            .iter()
            .zip(&keep)
            .map(|(row, mask)| {
                TableRow::new(
                    row.identifiers.clone(),
                    row.values
                        .iter()
                        .zip(mask)
                        .map(|(&v, &k)| if k { v } else { None })
                        .collect(),
                )
            })
            .collect();
        table.derived(table.name(), table.schema().clone(), rows)
    };

    Ok((
        LandmarkTrack {
            x: apply(&a.x),
            y: apply(&a.y),
        },
        LandmarkTrack {
            x: apply(&b.x),
            y: apply(&b.y),
        },
    ))
}
