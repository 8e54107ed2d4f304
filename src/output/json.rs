//! JSON output formatter for machine processing
//!
//! Every document is written as one pretty-printed JSON value.

use crate::domain::{Package, ResultSummary};
use crate::error::{AppError, ErrorKind};
use crate::manifest::ManifestHandle;
use crate::output::{OutputFormatter, Verbosity};
use crate::package_manager::{OptionMap, PackageInfo, SearchHit};
use crate::status::StatusReport;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn write<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(writer, "{}", json)
    }
}

/// JSON representation of a status report
#[derive(Serialize)]
struct JsonStatus<'a> {
    #[serde(flatten)]
    report: &'a StatusReport,
    /// Full package set (only in verbose mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<JsonPackage<'a>>>,
}

/// JSON representation of a package
#[derive(Serialize)]
struct JsonPackage<'a> {
    #[serde(flatten)]
    package: &'a Package,
    /// Derived status
    status: Option<&'static str>,
    version_out_of_sync: bool,
    has_update: bool,
}

impl<'a> From<&'a Package> for JsonPackage<'a> {
    fn from(package: &'a Package) -> Self {
        Self {
            package,
            status: package.status().map(|s| s.label()),
            version_out_of_sync: package.is_version_out_of_sync(),
            has_update: package.has_update(),
        }
    }
}

/// JSON representation of a command result
#[derive(Serialize)]
struct JsonSummary<'a> {
    command: &'a str,
    #[serde(flatten)]
    summary: &'a ResultSummary,
}

/// JSON representation of a manifest action
#[derive(Serialize)]
struct JsonManifest<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<&'a OptionMap>,
}

/// JSON representation of an error
#[derive(Serialize)]
struct JsonError<'a> {
    error: JsonErrorBody<'a>,
}

#[derive(Serialize)]
struct JsonErrorBody<'a> {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    packages: Vec<&'a str>,
}

impl OutputFormatter for JsonFormatter {
    fn format_status(
        &self,
        report: &StatusReport,
        packages: &[Package],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let packages = (self.verbosity == Verbosity::Verbose)
            .then(|| packages.iter().map(JsonPackage::from).collect());
        self.write(&JsonStatus { report, packages }, writer)
    }

    fn format_packages(&self, packages: &[Package], writer: &mut dyn Write) -> std::io::Result<()> {
        let packages: Vec<JsonPackage> = packages.iter().map(JsonPackage::from).collect();
        self.write(&packages, writer)
    }

    fn format_summary(
        &self,
        command: &str,
        summary: &ResultSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write(&JsonSummary { command, summary }, writer)
    }

    fn format_search(&self, hits: &[SearchHit], writer: &mut dyn Write) -> std::io::Result<()> {
        self.write(&hits, writer)
    }

    fn format_info(&self, info: &PackageInfo, writer: &mut dyn Write) -> std::io::Result<()> {
        self.write(info, writer)
    }

    fn format_configuration(
        &self,
        config: &OptionMap,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write(config, writer)
    }

    fn format_manifest(
        &self,
        action: &str,
        handle: Option<&ManifestHandle>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        use crate::manifest::StructuredFile;

        let output = JsonManifest {
            action,
            path: handle.map(|h| h.path.as_path()),
            manifest: handle.map(|h| h.document.as_object()),
        };
        self.write(&output, writer)
    }

    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()> {
        let packages = match error {
            AppError::Command(e) => e.packages(),
            _ => Vec::new(),
        };
        let output = JsonError {
            error: JsonErrorBody {
                kind: error.kind(),
                message: error.to_string(),
                packages,
            },
        };
        self.write(&output, writer)
    }
}
