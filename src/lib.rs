//! Synheart Kinematics - behavior metrics from tracked landmark trajectories.
//!
//! This library turns the per-frame coordinates of two body landmarks
//! (an anterior point such as the head and a posterior point such as the
//! trunk) into kinematic and angular metrics: distance and velocity of the
//! center of mass, heading angle and angular velocity, windowed
//! time-in-range probabilities and the mean squared displacement curve.
//!
//! # Data Model
//!
//! - **Missing values are explicit**: every cell is `Option<f64>`; the tracker's
//!   lost-point zeros and non-finite values become `None`
//! - **Schemas are explicit**: identifier columns and frame columns are named
//!   separately, never found by position
//! - **Inputs are never mutated**: every stage returns new tables
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Synheart Kinematics                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Dataset    │──▶│  Filtering  │──▶│ Kinematics  │       │
//! │  │  (tables)   │   │ (sync/frag) │   │  & Angles   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                 │               │
//! │                           ▼                 ▼               │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │ Processing  │   │   Metrics   │       │
//! │                    │    Log      │   │   Report    │       │
//! │                    └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_kinematics::{Config, MetricsPipeline, ReportBuilder, TrajectoryDataset};
//!
//! let json = std::fs::read_to_string("trial.json").unwrap();
//! let dataset: TrajectoryDataset = serde_json::from_str(&json).unwrap();
//!
//! let config = Config::default();
//! let pipeline = MetricsPipeline::new(config.clone()).unwrap();
//! let output = pipeline.run(&dataset).unwrap();
//!
//! println!("{}", ReportBuilder::new().build_json("trial.json", &config, output));
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod error;
pub mod table;

// Re-export key types at crate root for convenience
pub use audit::{create_shared_log, ProcessingLog, ProcessingStats, SharedProcessingLog};
pub use config::{Config, ConfigError, PositionBounds, ProbabilityConfig};
pub use core::{
    AngularRange, MetricsPipeline, MetricsReport, MsdCurve, PipelineOutput, ReportBuilder,
    SeparationBounds, WindowProbabilityRow,
};
pub use error::{MetricsError, Result};
pub use table::{
    Cell, CoordinateTable, DerivedMetricTable, FrameTable, LandmarkTrack, TableRow, TableSchema,
    TrajectoryDataset,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
