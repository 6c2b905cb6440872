// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_manifest_path;
use crate::types::ReportFormat;

/// Command-line arguments for `modloader`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "modloader",
    version,
    about = "Resolve a boot manifest of named modules and report what would fail to start.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the boot manifest (TOML).
    ///
    /// Default: `Modules.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_manifest_path())]
    pub manifest: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MODLOADER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print modules and startup order, but don't boot.
    #[arg(long)]
    pub dry_run: bool,

    /// How to print the boot report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Exit successfully even when some modules could not be started.
    #[arg(long)]
    pub allow_errors: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
