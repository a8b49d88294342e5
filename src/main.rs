//! segedit video segment editor
//!
//! Command-line host for the two editor workflows: exporting a cut list and
//! trimming a single range with re-encoding.
//!
//! # Usage
//!
//! ```bash
//! segedit cuts --duration 120 --cut 10-25 --cut 1:00-1:30
//! segedit cuts --input lesson.mp4 --thumbnail-at 0:42 --thumbnail-out cover.jpg
//! segedit trim --input lesson.mp4 --start 0:05 --end 0:15 --output intro.mp4
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use segedit::cli::{commands, Cli, Commands};
use segedit::utils::logging::init_logging;

/// Main entry point for the segedit CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    init_logging(&config.logging);
    segedit::init().context("Failed to initialize media libraries")?;

    info!("Starting segedit");

    // Execute the requested command
    match cli.command {
        Commands::Cuts(args) => {
            info!("Executing cuts command");
            commands::cuts(args, &config).await?;
        }
        Commands::Trim(args) => {
            info!("Executing trim command");
            commands::trim(args, &config).await?;
        }
    }

    info!("segedit completed successfully");
    Ok(())
}
