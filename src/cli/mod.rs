//! CLI module for segedit
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::EditorConfig;
use crate::utils::logging::LogLevel;

pub mod args;
pub mod commands;

/// segedit video segment editor
///
/// Marks cut lists against a video and trims single ranges with a
/// re-encoding codec runtime.
#[derive(Parser, Debug)]
#[command(name = "segedit")]
#[command(about = "Mark video segments and trim them with frame-accurate re-encoding")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a list of cut ranges as JSON
    Cuts(args::CutsArgs),
    /// Trim one range out of a video file
    Trim(args::TrimArgs),
}

impl Cli {
    /// Defaults, then the config file, then command-line overrides
    pub fn resolve_config(&self) -> Result<EditorConfig> {
        let mut config = match &self.config {
            Some(path) => EditorConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => EditorConfig::default(),
        };

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        match &self.command {
            Commands::Cuts(args) => args.apply_overrides(&mut config),
            Commands::Trim(args) => args.apply_overrides(&mut config),
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value).ok_or_else(|| format!("unknown log level '{}'", value))
}
