//! Output formatting for project state and command results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::{Package, ResultSummary};
use crate::error::AppError;
use crate::manifest::ManifestHandle;
use crate::package_manager::{OptionMap, PackageInfo, SearchHit};
use crate::status::StatusReport;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Minimal output
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with additional information
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: true,
        }
    }

    /// Whether a progress spinner may be drawn
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Text && self.verbosity != Verbosity::Quiet
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Sync status with the package set it was computed from
    fn format_status(
        &self,
        report: &StatusReport,
        packages: &[Package],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Package table
    fn format_packages(&self, packages: &[Package], writer: &mut dyn Write) -> std::io::Result<()>;

    /// Result of install / uninstall / update / prune
    fn format_summary(
        &self,
        command: &str,
        summary: &ResultSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Registry search results
    fn format_search(&self, hits: &[SearchHit], writer: &mut dyn Write) -> std::io::Result<()>;

    /// Registry information for one package
    fn format_info(&self, info: &PackageInfo, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Effective configuration
    fn format_configuration(
        &self,
        config: &OptionMap,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// A manifest was written or removed
    fn format_manifest(
        &self,
        action: &str,
        handle: Option<&ManifestHandle>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// A failed operation
    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}
