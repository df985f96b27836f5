//! mpseq CLI
//!
//! Replays mapping scripts against a subflow mapping registry.

mod config;
mod script;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use config::Config;
use script::Script;

/// mpseq - inspect subflow/data sequence mappings
#[derive(Parser)]
#[command(name = "mpseq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mapping script and print the outcome of every step
    Replay {
        /// Script file (TOML)
        #[arg(required = true)]
        script: PathBuf,
    },

    /// Parse a mapping script without running it
    Check {
        /// Script file (TOML)
        #[arg(required = true)]
        script: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Validate configuration
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { script } => replay(&script, &config)?,
        Commands::Check { script } => check(&script)?,
    }

    Ok(())
}

/// Replay a script and print one line per step
fn replay(path: &Path, config: &Config) -> anyhow::Result<()> {
    let script = Script::load(path)?;
    tracing::info!("Replaying {} steps from {}", script.steps.len(), path.display());

    for line in script.replay(&config.registry) {
        println!("{line}");
    }

    Ok(())
}

/// Parse a script and report its size
fn check(path: &Path) -> anyhow::Result<()> {
    let script = Script::load(path)?;

    match script.tx_head {
        Some(head) => println!(
            "{}: {} steps, transmit buffer head {}",
            path.display(),
            script.steps.len(),
            head
        ),
        None => println!(
            "{}: {} steps, no transmit buffer",
            path.display(),
            script.steps.len()
        ),
    }

    Ok(())
}
