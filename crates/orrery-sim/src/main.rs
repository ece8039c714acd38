//! Orrery Sim - Headless tracking run
//!
//! Follows one body through a Keplerian orbit with the tracking engine and
//! reports how far the camera drifted from the closed-form pose.

mod config;
mod run;

use anyhow::Result;
use clap::Parser;
use orrery_core::{PrecisionMode, PrecisionSettings};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "orrery-sim")]
#[command(about = "Headless orrery camera tracking and precision drift report")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "orrery.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Body to track
    #[arg(short, long)]
    target: Option<String>,

    /// Number of ticks to run
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Simulated time per tick
    #[arg(long)]
    dt: Option<f64>,

    /// Precision backend (standard, high_precision)
    #[arg(short, long)]
    precision: Option<PrecisionMode>,

    /// Working digits of the high-precision backend
    #[arg(long)]
    digits: Option<u64>,

    /// Run both backends side by side
    #[arg(long)]
    compare: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so the report on stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Orrery sim v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    if let Some(target) = args.target {
        config.run.target = target;
    }
    if let Some(ticks) = args.ticks {
        config.run.ticks = ticks;
    }
    if let Some(dt) = args.dt {
        config.run.dt = dt;
    }
    if let Some(mode) = args.precision {
        config.precision.mode = mode;
    }
    if let Some(digits) = args.digits {
        config.precision.digits = digits;
    }

    let backends = if args.compare {
        vec![
            PrecisionSettings::standard(),
            PrecisionSettings::high_precision(config.precision.digits),
        ]
    } else {
        vec![config.precision]
    };

    info!(
        body = %config.run.target,
        ticks = config.run.ticks,
        dt = config.run.dt,
        compare = args.compare,
        "Configuration loaded"
    );

    let report = run::simulate(&config, &backends)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    Ok(())
}
