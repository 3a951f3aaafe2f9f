//! ZombieRTS - Development Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zombie_core::config::CoreConfig;
use zombie_core::data::BlueprintRegistry;
use zombie_core::save::save_to_path;
use zombie_tools::simulate::{self, SimulationOptions};
use zombie_tools::validate::{validate_data_directory, ToolError};

#[derive(Parser)]
#[command(name = "zombie-tools")]
#[command(about = "Development tools for ZombieRTS")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
        /// Core config to cross-check resources against
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a scripted headless session
    Simulate {
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
        /// Core config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of ticks
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value_t = 0.05)]
        dt: f32,
        /// Hostile units to spawn
        #[arg(long, default_value_t = 0)]
        hostiles: usize,
        /// Write the final state as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig, ToolError> {
    Ok(match path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    })
}

fn run(cli: Cli) -> Result<(), ToolError> {
    match cli.command {
        Commands::Validate { path, config } => {
            tracing::info!("Validating data files in: {}", path.display());
            let config = config.as_deref().map(|p| load_config(Some(p))).transpose()?;
            let report = validate_data_directory(&path, config.as_ref())?;
            tracing::info!(buildings = report.buildings, units = report.units, "Validation passed");
        }
        Commands::Simulate {
            data,
            config,
            ticks,
            dt,
            hostiles,
            save,
        } => {
            let config = load_config(config.as_deref())?;
            let registry = BlueprintRegistry::load_dir(&data)?;
            let options = SimulationOptions { ticks, dt, hostiles };
            let summary = simulate::run(config, registry, &options)?;
            if let (Some(path), Some(state)) = (save, summary.save.as_ref()) {
                save_to_path(state, &path)?;
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("Failed: {e}");
        if let ToolError::Problems(problems) = &e {
            for problem in problems {
                eprintln!("  - {problem}");
            }
        }
        std::process::exit(1);
    }
}
