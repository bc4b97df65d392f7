//! Core functionality of the kinematics engine.
//!
//! This module contains:
//! - Missing-data alignment and fragment filtering
//! - Calibration and plausibility filters
//! - Distance, velocity, heading angle and angular velocity
//! - Windowed time-in-range probabilities and the MSD curve
//! - The end-to-end pipeline and its report

pub mod angles;
pub mod calibration;
pub mod fragments;
pub mod kinematics;
pub mod msd;
pub mod pipeline;
pub mod report;
pub mod sync;
pub mod windowing;

// Re-export commonly used types
pub use angles::{angular_velocity, heading_angles, wrap_angle, DEFAULT_ANGLE_OFFSET_RAD};
pub use calibration::{
    bound_positions, bound_separation, filter_below, scale, subsample_frames, SeparationBounds,
    DEFAULT_PIXEL_SIZE,
};
pub use fragments::{filter_fragments, DEFAULT_MIN_FRAGMENT_LEN};
pub use kinematics::{center_of_mass, distance, velocity};
pub use msd::{mean_squared_displacement, MsdCurve, MsdPoint};
pub use pipeline::{MetricsPipeline, PipelineOutput, StageMasking};
pub use report::{MetricsReport, ReportBuilder, PRODUCER_NAME, REPORT_VERSION};
pub use sync::{synchronize_missing, zeros_to_missing};
pub use windowing::{
    window_count, window_probability, window_probability_by_group, AngularRange,
    WindowProbabilityRow,
};
