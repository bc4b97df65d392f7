//! Versioned metrics report builder.
//!
//! A report bundles the derived tables of one dataset with the configuration
//! that produced them and provenance metadata, ready to hand to whatever
//! persists or plots it.

use crate::config::Config;
use crate::core::pipeline::PipelineOutput;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "synheart-kinematics";

/// Share of retained cells below which a dataset is flagged as degraded.
const DEGRADED_RETAINED_SHARE: f64 = 0.5;

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Host that computed the report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Data-quality summary of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    /// Coordinate cells in the dataset after subsampling
    pub cells_total: usize,
    /// Cells masked by filtering
    pub cells_masked: usize,
    /// Share of cells that survived filtering (0-1)
    pub retained_share: f64,
    /// Whether too little data survived to trust the metrics
    pub degraded: bool,
    /// Probability windows with a defined value
    pub defined_windows: usize,
    /// MSD lags without any measured frame pair
    pub empty_msd_lags: Vec<usize>,
}

impl QualitySummary {
    fn from_output(output: &PipelineOutput) -> Self {
        let cells_total = 4 * output.shape.0 * output.shape.1;
        let cells_masked = output.total_masked();
        let retained_share = if cells_total == 0 {
            0.0
        } else {
            1.0 - cells_masked as f64 / cells_total as f64
        };

        Self {
            cells_total,
            cells_masked,
            retained_share,
            degraded: retained_share < DEGRADED_RETAINED_SHARE,
            defined_windows: output
                .probabilities
                .iter()
                .map(|p| p.defined_count())
                .sum(),
            empty_msd_lags: output.msd.empty_lags(),
        }
    }
}

/// Metrics report for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Report format version
    pub report_version: String,
    /// When this payload was computed (RFC3339)
    pub computed_at_utc: String,
    /// Producer metadata
    pub producer: ReportProducer,
    /// Label of the dataset (e.g. its file name)
    pub source: String,
    /// Configuration the metrics were computed with
    pub config: Config,
    /// Data-quality summary
    pub quality: QualitySummary,
    /// Derived tables and curves
    pub outputs: PipelineOutput,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

impl MetricsReport {
    /// Serialize the report, pretty-printed or on a single line.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Builder for metrics reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    session_id: Option<String>,
}

impl ReportBuilder {
    /// Create a new report builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            session_id: None,
        }
    }

    /// Set the session ID for generated reports.
    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report from a pipeline output.
    pub fn build(&self, source: &str, config: &Config, outputs: PipelineOutput) -> MetricsReport {
        let computed_at = Utc::now();
        let quality = QualitySummary::from_output(&outputs);

        let mut meta = HashMap::new();
        meta.insert(
            "rows".to_string(),
            serde_json::Value::from(outputs.shape.0),
        );
        meta.insert(
            "frames".to_string(),
            serde_json::Value::from(outputs.shape.1),
        );
        meta.insert(
            "fragments_retained".to_string(),
            serde_json::Value::from(outputs.fragments_retained),
        );
        if let Some(ref session_id) = self.session_id {
            meta.insert(
                "session_id".to_string(),
                serde_json::Value::String(session_id.clone()),
            );
        }

        MetricsReport {
            report_version: REPORT_VERSION.to_string(),
            computed_at_utc: computed_at.to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: Some(self.instance_id.to_string()),
                host: hostname::get().ok().and_then(|h| h.into_string().ok()),
            },
            source: source.to_string(),
            config: config.clone(),
            quality,
            outputs,
            meta: Some(meta),
        }
    }

    /// Build and serialize a report to pretty JSON.
    pub fn build_json(&self, source: &str, config: &Config, outputs: PipelineOutput) -> String {
        let report = self.build(source, config, outputs);
        report.to_json(true).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::MetricsPipeline;
    use crate::table::{Cell, FrameTable, LandmarkTrack, TrajectoryDataset};

    fn output() -> PipelineOutput {
        let xs: Vec<Cell> = (0..12).map(|t| Some(10.0 + t as f64)).collect();
        let track = |name: &str, y: f64| {
            LandmarkTrack::new(
                FrameTable::from_values(format!("{name}_x"), vec![xs.clone()]).unwrap(),
                FrameTable::from_values(format!("{name}_y"), vec![vec![Some(y); 12]]).unwrap(),
            )
            .unwrap()
        };
        let dataset = TrajectoryDataset::new(track("anterior", 28.0), track("posterior", 20.0));
        MetricsPipeline::new(Config::default())
            .unwrap()
            .run(&dataset)
            .unwrap()
    }

    #[test]
    fn test_report_builder_instance_id() {
        let builder1 = ReportBuilder::new();
        let builder2 = ReportBuilder::new();
        assert_ne!(builder1.instance_id(), builder2.instance_id());
    }

    #[test]
    fn test_report_creation() {
        let builder = ReportBuilder::new().with_session_id("S-1".to_string());
        let report = builder.build("trial.json", &Config::default(), output());

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.source, "trial.json");
        assert_eq!(report.quality.cells_total, 48);
        assert_eq!(report.quality.cells_masked, 0);
        assert!(!report.quality.degraded);

        let meta = report.meta.as_ref().unwrap();
        assert_eq!(meta["session_id"], "S-1");
        assert_eq!(meta["frames"], 12);
    }

    #[test]
    fn test_report_json_serialization() {
        let builder = ReportBuilder::new();
        let json = builder.build_json("trial.json", &Config::default(), output());

        assert!(json.contains("report_version"));
        assert!(json.contains("computed_at_utc"));
        assert!(json.contains("producer"));
        assert!(json.contains("heading_angle"));
        assert!(json.contains("msd"));

        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.outputs.shape, (1, 12));
    }
}
