//! Data-quality log of a metrics session.
//!
//! Tracks how much data went in and how much each filtering stage removed,
//! so that a report can state what share of the measurements survived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Filtering stage that can mask cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskingStage {
    /// Anterior/posterior separation outside plausible bounds
    Separation,
    /// Zero coordinates written by the tracker for lost points
    Zeros,
    /// Coordinates outside the arena
    PositionBounds,
    /// Missing in the paired axis
    Synchronization,
    /// Fragment shorter than the minimum length
    Fragments,
}

/// Processing statistics for the current session.
#[derive(Debug)]
pub struct ProcessingLog {
    /// Number of datasets run through the pipeline
    datasets_processed: AtomicU64,
    /// Number of datasets rejected with an error
    datasets_failed: AtomicU64,
    /// Number of coordinate cells inspected
    cells_inspected: AtomicU64,
    /// Cells masked per stage
    masked_separation: AtomicU64,
    masked_zeros: AtomicU64,
    masked_position: AtomicU64,
    masked_sync: AtomicU64,
    masked_fragments: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl ProcessingLog {
    /// Create a new processing log.
    pub fn new() -> Self {
        Self {
            datasets_processed: AtomicU64::new(0),
            datasets_failed: AtomicU64::new(0),
            cells_inspected: AtomicU64::new(0),
            masked_separation: AtomicU64::new(0),
            masked_zeros: AtomicU64::new(0),
            masked_position: AtomicU64::new(0),
            masked_sync: AtomicU64::new(0),
            masked_fragments: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record a dataset that completed the pipeline.
    pub fn record_dataset(&self, cells: u64) {
        self.datasets_processed.fetch_add(1, Ordering::Relaxed);
        self.cells_inspected.fetch_add(cells, Ordering::Relaxed);
    }

    /// Record a dataset rejected with an error.
    pub fn record_failure(&self) {
        self.datasets_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record cells masked by a stage.
    pub fn record_masked(&self, stage: MaskingStage, count: u64) {
        self.counter(stage).fetch_add(count, Ordering::Relaxed);
    }

    fn counter(&self, stage: MaskingStage) -> &AtomicU64 {
        match stage {
            MaskingStage::Separation => &self.masked_separation,
            MaskingStage::Zeros => &self.masked_zeros,
            MaskingStage::PositionBounds => &self.masked_position,
            MaskingStage::Synchronization => &self.masked_sync,
            MaskingStage::Fragments => &self.masked_fragments,
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ProcessingStats {
        let masked = |stage| self.counter(stage).load(Ordering::Relaxed);
        ProcessingStats {
            datasets_processed: self.datasets_processed.load(Ordering::Relaxed),
            datasets_failed: self.datasets_failed.load(Ordering::Relaxed),
            cells_inspected: self.cells_inspected.load(Ordering::Relaxed),
            masked_separation: masked(MaskingStage::Separation),
            masked_zeros: masked(MaskingStage::Zeros),
            masked_position: masked(MaskingStage::PositionBounds),
            masked_sync: masked(MaskingStage::Synchronization),
            masked_fragments: masked(MaskingStage::Fragments),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Datasets processed: {}\n\
             - Datasets failed: {}\n\
             - Coordinate cells inspected: {}\n\
             \n\
             Cells masked:\n\
             - Implausible separation: {}\n\
             - Zero coordinates: {}\n\
             - Outside arena: {}\n\
             - Unpaired axis: {}\n\
             - Short fragments: {}\n\
             - Retained share: {:.1}%",
            stats.datasets_processed,
            stats.datasets_failed,
            stats.cells_inspected,
            stats.masked_separation,
            stats.masked_zeros,
            stats.masked_position,
            stats.masked_sync,
            stats.masked_fragments,
            stats.retained_share() * 100.0
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.datasets_processed,
            &self.datasets_failed,
            &self.cells_inspected,
            &self.masked_separation,
            &self.masked_zeros,
            &self.masked_position,
            &self.masked_sync,
            &self.masked_fragments,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of processing statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub datasets_processed: u64,
    pub datasets_failed: u64,
    pub cells_inspected: u64,
    pub masked_separation: u64,
    pub masked_zeros: u64,
    pub masked_position: u64,
    pub masked_sync: u64,
    pub masked_fragments: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl ProcessingStats {
    /// Total cells masked by any stage.
    pub fn total_masked(&self) -> u64 {
        self.masked_separation
            + self.masked_zeros
            + self.masked_position
            + self.masked_sync
            + self.masked_fragments
    }

    /// Share of inspected cells that no stage masked (1.0 when nothing was inspected).
    pub fn retained_share(&self) -> f64 {
        if self.cells_inspected == 0 {
            return 1.0;
        }
        1.0 - self.total_masked() as f64 / self.cells_inspected as f64
    }
}

/// Thread-safe shared processing log.
pub type SharedProcessingLog = Arc<ProcessingLog>;

/// Create a new shared processing log.
pub fn create_shared_log() -> SharedProcessingLog {
    Arc::new(ProcessingLog::new())
}
