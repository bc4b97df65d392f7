//! Error types shared by the metrics engine.

use crate::table::ColumnRole;
use thiserror::Error;

/// Errors raised by table construction and metric computation.
///
/// Missing measurements are never errors: they travel through the engine as
/// `None` cells, and an MSD lag or probability window with no valid samples
/// is reported as `None` as well.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// Two tables that must be cell-aligned disagree in shape.
    #[error(
        "shape mismatch: `{left}` is {}x{} but `{right}` is {}x{}",
        .left_shape.0,
        .left_shape.1,
        .right_shape.0,
        .right_shape.1
    )]
    ShapeMismatch {
        left: String,
        right: String,
        /// (rows, frames)
        left_shape: (usize, usize),
        /// (rows, frames)
        right_shape: (usize, usize),
    },

    /// A parameter is outside its valid domain.
    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    Configuration {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A row does not match the width declared by the table schema.
    #[error("malformed row {row} in `{table}`: expected {expected} {kind} cells, found {found}")]
    MalformedRow {
        table: String,
        row: usize,
        kind: ColumnRole,
        expected: usize,
        found: usize,
    },
}

impl MetricsError {
    /// Build a configuration error for a parameter value.
    pub fn config(parameter: &'static str, value: impl ToString, reason: &'static str) -> Self {
        MetricsError::Configuration {
            parameter,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether the error was raised before any computation started.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MetricsError::Configuration { .. })
    }
}

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
