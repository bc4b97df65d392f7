//! Tabular data model for tracked trajectories.
//!
//! Tables carry explicit column roles instead of positional offsets: a
//! schema names the identifier columns and the frame columns separately.

pub mod dataset;
pub mod types;

// Re-export commonly used types
pub use dataset::{LandmarkTrack, TrajectoryDataset};
pub use types::{
    Cell, ColumnRole, CoordinateTable, DerivedMetricTable, FrameTable, TableRow, TableSchema,
};
