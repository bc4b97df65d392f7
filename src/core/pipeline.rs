//! End-to-end metrics pipeline for one trajectory dataset.
//!
//! ```text
//! dataset ─▶ stride ─▶ separation ─▶ zeros ─▶ arena ─▶ x/y sync ─▶ fragments ─▶ scale
//!                                                                                 │
//!                   ┌──────────────────────────────┬──────────────────────────────┤
//!                   ▼                              ▼                              ▼
//!           center of mass                  heading angles                (both landmarks)
//!           ├─ distance / velocity          ├─ angular velocity
//!           └─ MSD curve                    └─ window probabilities
//! ```

use crate::audit::{MaskingStage, SharedProcessingLog};
use crate::config::Config;
use crate::core::angles::{angular_velocity, heading_angles};
use crate::core::calibration::{
    bound_positions, bound_separation, filter_below, scale, subsample_frames,
};
use crate::core::fragments::{filter_fragments, fragment_lengths};
use crate::core::kinematics::{center_of_mass, distance, velocity};
use crate::core::msd::{mean_squared_displacement, MsdCurve};
use crate::core::sync::{synchronize_missing, zeros_to_missing};
use crate::core::windowing::{window_probability_by_group, WindowProbabilityRow};
use crate::error::Result;
use crate::table::{DerivedMetricTable, LandmarkTrack, TrajectoryDataset};
use serde::{Deserialize, Serialize};

/// Cells masked by one filtering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMasking {
    pub stage: MaskingStage,
    pub masked: usize,
}

/// Every artifact derived from one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// (rows, frames) after subsampling
    pub shape: (usize, usize),
    /// Center of mass of the two landmarks, in scaled units
    pub center_of_mass: LandmarkTrack,
    /// Frame-to-frame distance of the center of mass
    pub distance: DerivedMetricTable,
    /// Center-of-mass velocity; requires an exposure time
    pub velocity: Option<DerivedMetricTable>,
    /// Velocity with values below the speed threshold removed
    pub thresholded_velocity: Option<DerivedMetricTable>,
    /// Heading angle in radians
    pub angles: DerivedMetricTable,
    /// Angular velocity in radians per second; requires an exposure time
    pub angular_velocity: Option<DerivedMetricTable>,
    /// Time-in-range probabilities per identifier group
    pub probabilities: Vec<WindowProbabilityRow>,
    /// Mean squared displacement of the center of mass
    pub msd: MsdCurve,
    /// Cells masked per filtering stage, in pipeline order
    pub masking: Vec<StageMasking>,
    /// Number of fragments that survived the fragment filter (anterior x)
    pub fragments_retained: usize,
}

impl PipelineOutput {
    /// Total cells masked across all stages.
    pub fn total_masked(&self) -> usize {
        self.masking.iter().map(|m| m.masked).sum()
    }
}

/// Runs the full metrics flow with a validated configuration.
#[derive(Debug, Clone)]
pub struct MetricsPipeline {
    config: Config,
    log: Option<SharedProcessingLog>,
}

impl MetricsPipeline {
    /// Create a pipeline, rejecting invalid configuration up front.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, log: None })
    }

    /// Record processing statistics into a shared log.
    pub fn with_log(mut self, log: SharedProcessingLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage on `dataset`.
    pub fn run(&self, dataset: &TrajectoryDataset) -> Result<PipelineOutput> {
        let result = self.run_stages(dataset);
        if let (Err(e), Some(log)) = (&result, &self.log) {
            tracing::warn!(error = %e, "dataset rejected");
            log.record_failure();
        }
        result
    }

    fn run_stages(&self, dataset: &TrajectoryDataset) -> Result<PipelineOutput> {
        let config = &self.config;
        dataset.validate()?;

        let stride = config.frame_stride;
        let mut anterior = dataset
            .anterior
            .map(|t| subsample_frames(t, stride))?;
        let mut posterior = dataset
            .posterior
            .map(|t| subsample_frames(t, stride))?;
        let shape = anterior.shape();
        tracing::debug!(rows = shape.0, frames = shape.1, stride, "dataset prepared");

        let mut masking = Vec::new();
        let mut record = |stage: MaskingStage, before: usize, after: usize| {
            let masked = after.saturating_sub(before);
            tracing::debug!(?stage, masked, "stage complete");
            masking.push(StageMasking { stage, masked });
        };

        let before = missing(&anterior, &posterior);
        (anterior, posterior) =
            bound_separation(&anterior, &posterior, config.separation, config.pixel_size)?;
        record(MaskingStage::Separation, before, missing(&anterior, &posterior));

        let before = missing(&anterior, &posterior);
        anterior = anterior.map(|t| Ok(zeros_to_missing(t)))?;
        posterior = posterior.map(|t| Ok(zeros_to_missing(t)))?;
        record(MaskingStage::Zeros, before, missing(&anterior, &posterior));

        if let Some(bounds) = config.position_bounds {
            let before = missing(&anterior, &posterior);
            // x only; the x/y sync below carries the cut over to y
            anterior.x = bound_positions(&anterior.x, bounds.min, bounds.max);
            posterior.x = bound_positions(&posterior.x, bounds.min, bounds.max);
            record(MaskingStage::PositionBounds, before, missing(&anterior, &posterior));
        }

        let before = missing(&anterior, &posterior);
        anterior = synchronize_track(&anterior)?;
        posterior = synchronize_track(&posterior)?;
        record(MaskingStage::Synchronization, before, missing(&anterior, &posterior));

        let before = missing(&anterior, &posterior);
        let min_len = config.min_fragment_len;
        anterior = anterior.map(|t| filter_fragments(t, min_len))?;
        posterior = posterior.map(|t| filter_fragments(t, min_len))?;
        record(MaskingStage::Fragments, before, missing(&anterior, &posterior));

        let fragments_retained = anterior
            .x
            .rows()
            .iter()
            .map(|row| fragment_lengths(&row.values).len())
            .sum();

        let factor = config.pixel_size;
        let anterior = anterior.map(|t| Ok(scale(t, factor)))?;
        let posterior = posterior.map(|t| Ok(scale(t, factor)))?;

        let com = LandmarkTrack::new(
            center_of_mass(&anterior.x, &posterior.x)?.renamed("com_x"),
            center_of_mass(&anterior.y, &posterior.y)?.renamed("com_y"),
        )?;

        let steps = distance(&com.x, &com.y)?;
        let com_velocity = config
            .exposure_time_secs
            .map(|dt| velocity(&com.x, &com.y, dt))
            .transpose()?;
        let thresholded_velocity = match (&com_velocity, config.speed_threshold) {
            (Some(v), Some(threshold)) => Some(filter_below(v, threshold)),
            _ => None,
        };

        let angles = heading_angles(&anterior, &posterior, config.angle_offset_rad)?;
        let omega = config
            .exposure_time_secs
            .map(|dt| angular_velocity(&angles, dt))
            .transpose()?;
        if config.exposure_time_secs.is_none() {
            tracing::debug!("no exposure time configured, skipping velocities");
        }

        let probabilities = match &config.probability {
            Some(p) => window_probability_by_group(&angles, p.range()?, p.window_frames)?,
            None => Vec::new(),
        };

        let msd = mean_squared_displacement(&com.x, &com.y)?;

        let output = PipelineOutput {
            shape,
            center_of_mass: com,
            distance: steps,
            velocity: com_velocity,
            thresholded_velocity,
            angles,
            angular_velocity: omega,
            probabilities,
            msd,
            masking,
            fragments_retained,
        };

        if let Some(log) = &self.log {
            log.record_dataset((4 * shape.0 * shape.1) as u64);
            for m in &output.masking {
                log.record_masked(m.stage, m.masked as u64);
            }
        }

        tracing::info!(
            rows = shape.0,
            frames = shape.1,
            masked = output.total_masked(),
            lags = output.msd.len(),
            "metrics computed"
        );

        Ok(output)
    }
}

fn missing(a: &LandmarkTrack, b: &LandmarkTrack) -> usize {
    a.missing_count() + b.missing_count()
}

fn synchronize_track(track: &LandmarkTrack) -> Result<LandmarkTrack> {
    let (x, y) = synchronize_missing(&track.x, &track.y)?;
    Ok(LandmarkTrack { x, y })
}
