//! InfinityKit CLI - extract, upscale and assemble Infinity Engine resources

pub mod commands;
pub mod progress;

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;

use crate::config::{CONFIG_FILE, Config, GameVariant};

#[derive(Parser)]
#[command(name = "infinitykit")]
#[command(about = "InfinityKit: Infinity Engine resource converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Upscale factor (overrides the configuration)
    #[arg(short, long, global = true)]
    factor: Option<u32>,

    /// Game variant (overrides the configuration)
    #[arg(short, long, global = true, value_enum)]
    game: Option<GameVariant>,

    /// Game directory holding the source resources
    #[arg(long, global = true)]
    game_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress the progress bar
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Settings resolved from the configuration file and global flags
pub struct Settings {
    pub config: Config,
    pub quiet: bool,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut config = Config::load(&self.config)?;
        if let Some(factor) = self.factor {
            config.upscale_factor = factor;
        }
        if let Some(game) = self.game {
            config.game = game;
        }
        if let Some(dir) = &self.game_dir {
            config.game_dir.clone_from(dir);
        }
        config.validate()?;
        Ok(Settings {
            config,
            quiet: self.quiet,
        })
    }
}

/// Run the InfinityKit CLI
///
/// Returns `Ok(false)` when any resource failed or arguments were missing.
pub fn run_cli() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let settings = cli.settings()?;
    cli.command.execute(&settings)
}
