//! Landmark tracks and the four-table trajectory dataset.

use crate::error::Result;
use crate::table::types::CoordinateTable;
use serde::{Deserialize, Serialize};

/// Paired x/y coordinate tables of one tracked landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkTrack {
    pub x: CoordinateTable,
    pub y: CoordinateTable,
}

impl LandmarkTrack {
    /// Pair two coordinate tables, requiring identical shapes.
    pub fn new(x: CoordinateTable, y: CoordinateTable) -> Result<Self> {
        x.ensure_same_shape(&y)?;
        Ok(Self { x, y })
    }

    /// (rows, frames)
    pub fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }

    /// Missing cells across both axes.
    pub fn missing_count(&self) -> usize {
        self.x.missing_count() + self.y.missing_count()
    }

    /// Apply the same table transformation to both axes.
    pub fn map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&CoordinateTable) -> Result<CoordinateTable>,
    {
        Ok(Self {
            x: f(&self.x)?,
            y: f(&self.y)?,
        })
    }
}

/// Everything the engine needs for one experiment: two landmarks, two axes each.
///
/// The anterior landmark is the one the heading points towards (e.g. the
/// palp), the posterior one is the reference (e.g. the back of the trunk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDataset {
    pub anterior: LandmarkTrack,
    pub posterior: LandmarkTrack,
}

impl TrajectoryDataset {
    pub fn new(anterior: LandmarkTrack, posterior: LandmarkTrack) -> Self {
        Self {
            anterior,
            posterior,
        }
    }

    /// Check that all four tables share row count and frame count.
    pub fn validate(&self) -> Result<()> {
        let reference = &self.anterior.x;
        for table in [&self.anterior.y, &self.posterior.x, &self.posterior.y] {
            reference.ensure_same_shape(table)?;
        }
        Ok(())
    }

    /// (rows, frames) of the anterior x table.
    pub fn shape(&self) -> (usize, usize) {
        self.anterior.shape()
    }

    /// Missing cells across all four tables.
    pub fn missing_count(&self) -> usize {
        self.anterior.missing_count() + self.posterior.missing_count()
    }

    /// Total cells across all four tables.
    pub fn cell_count(&self) -> usize {
        let (rows, frames) = self.shape();
        4 * rows * frames
    }
}
