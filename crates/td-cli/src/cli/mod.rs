//! CLI entry and dispatch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use td_core::logging::{self, LogConfig};
use td_monitor::MonitorOptions;

mod commands;

#[derive(Parser)]
#[command(name = "td")]
#[command(version)]
#[command(about = "Live terminal monitor for td issues")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project directory holding `.todos/` (default: current directory)
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Seconds between automatic refreshes
    #[arg(long, value_name = "SECS", default_value_t = 2, env = "TD_REFRESH_INTERVAL")]
    interval: u64,

    /// Log level or filter directive (overrides TD_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the interactive monitor (default)
    Monitor,
    /// Fill an empty project with sample issues
    Seed,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Held for the whole process so buffered log lines are flushed.
    let _log_guard = logging::init(
        &cli.dir,
        &LogConfig {
            level: cli.log_level.clone(),
        },
    )
    .context("init logging")?;

    match cli.command.unwrap_or(Commands::Monitor) {
        Commands::Monitor => {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            let _enter = rt.enter();
            let options = MonitorOptions {
                refresh_interval: Duration::from_secs(cli.interval.max(1)),
                version: env!("CARGO_PKG_VERSION").to_string(),
                embedded: false,
            };
            commands::monitor::run(&cli.dir, options)
        }
        Commands::Seed => commands::seed::run(&cli.dir),
    }
}
