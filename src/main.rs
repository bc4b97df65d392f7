//! Synheart Kinematics CLI
//!
//! Computes behavior metrics from serialized trajectory datasets.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use synheart_kinematics::{
    audit::create_shared_log,
    config::{Config, ProbabilityConfig},
    core::{MetricsPipeline, MetricsReport, ReportBuilder},
    table::TrajectoryDataset,
    VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-kinematics")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Kinematic and angular metrics from tracked landmark trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full metrics report for one or more datasets
    Analyze {
        /// Dataset files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Duration of one frame in seconds
        #[arg(long)]
        exposure_time: Option<f64>,

        /// Window size in frames for time-in-range probabilities
        #[arg(long)]
        window: Option<usize>,

        /// Lower bound of the angular range, in degrees
        #[arg(long)]
        angle_lower: Option<f64>,

        /// Upper bound of the angular range, in degrees
        #[arg(long)]
        angle_upper: Option<f64>,

        /// Session label recorded in every report
        #[arg(long)]
        session: Option<String>,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Compute only the mean squared displacement curve of a dataset
    Msd {
        /// Dataset file (JSON)
        file: PathBuf,

        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show configuration
    Config,

    /// Write the default configuration to the user config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Command-line overrides applied on top of the loaded configuration.
struct Overrides {
    exposure_time: Option<f64>,
    window: Option<usize>,
    angle_lower: Option<f64>,
    angle_upper: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            files,
            config,
            exposure_time,
            window,
            angle_lower,
            angle_upper,
            session,
            compact,
        } => {
            let overrides = Overrides {
                exposure_time,
                window,
                angle_lower,
                angle_upper,
            };
            cmd_analyze(&files, config.as_deref(), overrides, session, compact)
        }
        Commands::Msd {
            file,
            config,
            compact,
        } => cmd_msd(&file, config.as_deref(), compact),
        Commands::Config => cmd_config(),
        Commands::InitConfig { force } => cmd_init_config(force),
    }
}

/// Install a stderr subscriber so stdout carries only JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load user config")?,
    };
    Ok(config)
}

fn apply_overrides(config: &mut Config, overrides: Overrides) -> anyhow::Result<()> {
    if let Some(dt) = overrides.exposure_time {
        config.exposure_time_secs = Some(dt);
    }

    let any_probability = overrides.window.is_some()
        || overrides.angle_lower.is_some()
        || overrides.angle_upper.is_some();
    if !any_probability {
        return Ok(());
    }

    let probability = match (
        config.probability,
        overrides.window,
        overrides.angle_lower,
        overrides.angle_upper,
    ) {
        (Some(base), window, lower, upper) => ProbabilityConfig {
            lower_deg: lower.unwrap_or(base.lower_deg),
            upper_deg: upper.unwrap_or(base.upper_deg),
            window_frames: window.unwrap_or(base.window_frames),
        },
        (None, Some(window_frames), Some(lower_deg), Some(upper_deg)) => ProbabilityConfig {
            lower_deg,
            upper_deg,
            window_frames,
        },
        (None, ..) => bail!(
            "--window, --angle-lower and --angle-upper must be given together \
             when the configuration has no probability section"
        ),
    };
    config.probability = Some(probability);
    Ok(())
}

fn load_dataset(path: &Path) -> anyhow::Result<TrajectoryDataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dataset: TrajectoryDataset = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;
    Ok(dataset)
}

fn cmd_analyze(
    files: &[PathBuf],
    config_path: Option<&Path>,
    overrides: Overrides,
    session: Option<String>,
    compact: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, overrides)?;

    let log = create_shared_log();
    let pipeline = MetricsPipeline::new(config.clone())
        .context("invalid configuration")?
        .with_log(log.clone());

    let mut builder = ReportBuilder::new();
    if let Some(session) = session {
        builder = builder.with_session_id(session);
    }
    tracing::info!(
        files = files.len(),
        instance_id = %builder.instance_id(),
        "analyzing datasets"
    );

    let results: Vec<anyhow::Result<MetricsReport>> = files
        .par_iter()
        .map(|path| {
            let dataset = load_dataset(path)?;
            let output = pipeline
                .run(&dataset)
                .with_context(|| format!("failed to analyze {}", path.display()))?;
            Ok(builder.build(&path.display().to_string(), &config, output))
        })
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = 0usize;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::error!("{e:#}");
                failed += 1;
            }
        }
    }

    let json = match (reports.len(), compact) {
        (1, false) => serde_json::to_string_pretty(&reports[0])?,
        (1, true) => serde_json::to_string(&reports[0])?,
        (_, false) => serde_json::to_string_pretty(&reports)?,
        (_, true) => serde_json::to_string(&reports)?,
    };
    if !reports.is_empty() {
        println!("{json}");
    }

    eprintln!("{}", log.summary());

    if failed > 0 {
        bail!("{failed} of {} dataset(s) failed", files.len());
    }
    Ok(())
}

fn cmd_msd(file: &Path, config_path: Option<&Path>, compact: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pipeline = MetricsPipeline::new(config).context("invalid configuration")?;

    let dataset = load_dataset(file)?;
    let output = pipeline
        .run(&dataset)
        .with_context(|| format!("failed to analyze {}", file.display()))?;

    let json = if compact {
        serde_json::to_string(&output.msd)?
    } else {
        serde_json::to_string_pretty(&output.msd)?
    };
    println!("{json}");
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        eprintln!("Warning: {e}");
    }
    Ok(())
}

fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default()
        .save_to(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
