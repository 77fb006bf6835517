//! One-shot conflict check over a mission file.
//!
//! Usage:
//!   cargo run -p deconflict-cli --bin deconflict -- --missions missions.json
//!
//! Exits 0 when clear, 2 when conflicts are detected and 1 on error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use deconflict_cli::{load_missions, render_report, CliConfig};
use deconflict_core::{
    analyze_concurrent, analyze_primary_with_control, ConflictReport, RunControl, TimeSpan,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Check drone missions for loss of separation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON array of mission plans
    #[arg(long)]
    missions: PathBuf,

    /// Minimum allowed separation (env: DECONFLICT_SAFETY_BUFFER)
    #[arg(long)]
    safety_buffer: Option<f64>,

    /// Sampling step in time units (env: DECONFLICT_SAMPLE_STEP)
    #[arg(long)]
    sample_step: Option<f64>,

    /// Start of the analysis window
    #[arg(long, requires = "window_end")]
    window_start: Option<f64>,

    /// End of the analysis window
    #[arg(long, requires = "window_start")]
    window_end: Option<f64>,

    /// Only check pairs involving this drone
    #[arg(long)]
    primary: Option<String>,

    /// Abort the run after this many milliseconds (env: DECONFLICT_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) -> Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive("deconflict=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

async fn run(args: Args) -> Result<ConflictReport> {
    let env = CliConfig::from_env();
    let mut config = env.engine_config();
    if let Some(buffer) = args.safety_buffer {
        config = config.with_safety_buffer(buffer);
    }
    if let Some(step) = args.sample_step {
        config = config.with_sample_step(step);
    }
    if let (Some(start), Some(end)) = (args.window_start, args.window_end) {
        config = config.with_analysis_window(TimeSpan::new(start, end));
    }
    let timeout = args.timeout_ms.map(Duration::from_millis).or(env.timeout);

    let missions = load_missions(&args.missions)?;
    tracing::info!(
        safety_buffer = config.safety_buffer,
        sample_step = config.sample_step,
        "checking {} mission(s)",
        missions.len()
    );

    let report = match args.primary {
        Some(primary_id) => {
            let Some(index) = missions.iter().position(|m| m.drone_id() == primary_id) else {
                bail!("primary drone '{}' is not in the mission file", primary_id);
            };
            let mut traffic = missions;
            let primary = traffic.remove(index);
            let control = match timeout {
                Some(limit) => RunControl::new().with_timeout(limit),
                None => RunControl::new(),
            };
            analyze_primary_with_control(&primary, &traffic, &config, &control)?
        }
        None => analyze_concurrent(Arc::from(missions), config.clone(), timeout).await?,
    };

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{}", text);
    } else {
        print!("{}", render_report(&report, config.safety_buffer));
    }
    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(args.log_json) {
        eprintln!("failed to initialise logging: {:#}", err);
        return ExitCode::from(1);
    }

    match run(args).await {
        Ok(report) if report.has_conflicts() => {
            tracing::warn!("Detected {} conflict(s)", report.len());
            ExitCode::from(2)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(1)
        }
    }
}
