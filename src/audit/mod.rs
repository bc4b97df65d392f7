//! Audit module for the kinematics engine.
//!
//! Keeps running counts of processed datasets and of the cells each
//! filtering stage masked.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, MaskingStage, ProcessingLog, ProcessingStats, SharedProcessingLog,
};
