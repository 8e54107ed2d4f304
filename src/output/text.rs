//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Colored status line with missing / untracked / out-of-range lists
//! - Aligned package table with update hints
//! - Command summaries, search results, package info and configuration

use crate::domain::{DependencyType, Package, PackageStatus, ResultSummary, SyncStatus};
use crate::error::AppError;
use crate::manifest::ManifestHandle;
use crate::output::{OutputFormatter, Verbosity};
use crate::package_manager::{OptionMap, PackageInfo, SearchHit};
use crate::status::{package_names, StatusReport};
use colored::Colorize;
use serde_json::Value;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn status_label(&self, status: SyncStatus) -> String {
        if !self.color {
            return status.label().to_string();
        }
        match status {
            SyncStatus::Synced => status.label().green().bold().to_string(),
            SyncStatus::OutOfSync => status.label().yellow().bold().to_string(),
            SyncStatus::Unknown => status.label().dimmed().to_string(),
        }
    }

    fn package_status_label(&self, package: &Package) -> String {
        let label = if package.is_version_out_of_sync() {
            "out of range"
        } else {
            package.status().map(|s| s.label()).unwrap_or("?")
        };
        if !self.color {
            return label.to_string();
        }
        match package.status() {
            _ if package.is_version_out_of_sync() => label.yellow().to_string(),
            Some(PackageStatus::Installed) => label.green().to_string(),
            Some(PackageStatus::Missing) => label.red().to_string(),
            Some(PackageStatus::NotTracked) => label.yellow().to_string(),
            None => label.dimmed().to_string(),
        }
    }

    fn write_list(
        &self,
        title: &str,
        packages: &[Package],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let names = package_names(packages);
        if self.color {
            writeln!(writer, "  {} {}", format!("{}:", title).dimmed(), names.join(", "))
        } else {
            writeln!(writer, "  {}: {}", title, names.join(", "))
        }
    }

    /// Format a single package line
    fn format_package_line(
        &self,
        package: &Package,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let declared = package.declared_version.as_deref().unwrap_or("-");
        let installed = package.version.as_deref().unwrap_or("-");
        let dev_marker = if package.dependency_type == DependencyType::Development {
            " 🔧"
        } else {
            ""
        };
        let update = match (package.has_update(), &package.latest_version) {
            (true, Some(latest)) => Some(latest.as_str()),
            _ => None,
        };
        let status = self.package_status_label(package);

        if self.color {
            let name_display = format!("{:width$}", package.name, width = max_name_len);
            let update_display = update
                .map(|latest| format!(" {} {}", "→".dimmed(), latest.bright_white().bold()))
                .unwrap_or_default();
            writeln!(
                writer,
                "  {} {:12} {:12} [{}]{}{}",
                name_display,
                declared.dimmed(),
                installed,
                status,
                update_display,
                dev_marker.dimmed()
            )
        } else {
            let update_display = update
                .map(|latest| format!(" -> {}", latest))
                .unwrap_or_default();
            writeln!(
                writer,
                "  {:width$} {:12} {:12} [{}]{}{}",
                package.name,
                declared,
                installed,
                status,
                update_display,
                dev_marker,
                width = max_name_len
            )
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_status(
        &self,
        report: &StatusReport,
        packages: &[Package],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return writeln!(writer, "{}", report.status.label());
        }

        writeln!(writer, "Status: {}", self.status_label(report.status))?;
        self.write_list("missing", &report.missing, writer)?;
        self.write_list("untracked", &report.untracked, writer)?;
        self.write_list("out of range", &report.version_out_of_sync, writer)?;

        if self.verbosity == Verbosity::Verbose && !packages.is_empty() {
            writeln!(writer)?;
            self.format_packages(packages, writer)?;
        }
        Ok(())
    }

    fn format_packages(&self, packages: &[Package], writer: &mut dyn Write) -> std::io::Result<()> {
        if packages.is_empty() {
            if self.verbosity != Verbosity::Quiet {
                writeln!(writer, "No packages.")?;
            }
            return Ok(());
        }

        if self.verbosity == Verbosity::Quiet {
            for package in packages {
                writeln!(writer, "{}", package)?;
            }
            return Ok(());
        }

        let max_name_len = packages
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0)
            .max(20);
        for package in packages {
            self.format_package_line(package, max_name_len, writer)?;
            if self.verbosity == Verbosity::Verbose && !package.cached_versions.is_empty() {
                let cached = format!("cached: {}", package.cached_versions.join(", "));
                if self.color {
                    writeln!(writer, "    {}", cached.dimmed())?;
                } else {
                    writeln!(writer, "    {}", cached)?;
                }
            }
        }
        Ok(())
    }

    fn format_summary(
        &self,
        command: &str,
        summary: &ResultSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        let noun = if summary.count == 1 { "package" } else { "packages" };
        if self.color {
            writeln!(
                writer,
                "{} {} {}",
                command.bold(),
                summary.count.to_string().green(),
                noun
            )?;
        } else {
            writeln!(writer, "{} {} {}", command, summary.count, noun)?;
        }

        for (name, package) in &summary.packages {
            match package.version {
                Some(ref version) => writeln!(writer, "  {}#{}", name, version)?,
                None => writeln!(writer, "  {}", name)?,
            }
            if self.verbosity == Verbosity::Verbose {
                if let Some(ref directory) = package.directory {
                    writeln!(writer, "    {}", directory.display())?;
                }
            }
        }
        Ok(())
    }

    fn format_search(&self, hits: &[SearchHit], writer: &mut dyn Write) -> std::io::Result<()> {
        if hits.is_empty() {
            return writeln!(writer, "No results.");
        }
        let max_name_len = hits.iter().map(|h| h.name.len()).max().unwrap_or(0);
        for hit in hits {
            let url = hit.url.as_deref().unwrap_or("");
            if self.color {
                writeln!(
                    writer,
                    "  {} {}",
                    format!("{:width$}", hit.name, width = max_name_len).bold(),
                    url.dimmed()
                )?;
            } else {
                writeln!(writer, "  {:width$} {}", hit.name, url, width = max_name_len)?;
            }
        }
        Ok(())
    }

    fn format_info(&self, info: &PackageInfo, writer: &mut dyn Write) -> std::io::Result<()> {
        let latest = info.latest_version.as_deref().unwrap_or("-");
        if self.color {
            writeln!(writer, "{} {}", info.name.bold(), latest.green())?;
        } else {
            writeln!(writer, "{} {}", info.name, latest)?;
        }
        if let Some(ref description) = info.description {
            writeln!(writer, "  {}", description)?;
        }
        if let Some(ref homepage) = info.homepage {
            writeln!(writer, "  {}", homepage)?;
        }
        if !info.versions.is_empty() && self.verbosity != Verbosity::Quiet {
            let shown = if self.verbosity == Verbosity::Verbose {
                info.versions.len()
            } else {
                info.versions.len().min(10)
            };
            writeln!(writer, "  versions: {}", info.versions[..shown].join(", "))?;
            if shown < info.versions.len() {
                writeln!(writer, "  ... and {} more", info.versions.len() - shown)?;
            }
        }
        Ok(())
    }

    fn format_configuration(
        &self,
        config: &OptionMap,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for (key, value) in config {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if self.color {
                writeln!(writer, "{} = {}", key.bold(), value)?;
            } else {
                writeln!(writer, "{} = {}", key, value)?;
            }
        }
        Ok(())
    }

    fn format_manifest(
        &self,
        action: &str,
        handle: Option<&ManifestHandle>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        match handle {
            Some(handle) => {
                let declared = handle.document.declared().len();
                writeln!(
                    writer,
                    "{} {} ({} declared)",
                    action,
                    handle.path.display(),
                    declared
                )
            }
            None => writeln!(writer, "{}", action),
        }
    }

    fn format_error(&self, error: &AppError, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "{} {}", "Error:".red().bold(), error)
        } else {
            writeln!(writer, "Error: {}", error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AffectedPackage;
    use crate::error::CommandError;
    use crate::status::compute_status;

    fn render<F>(verbosity: Verbosity, f: F) -> String
    where
        F: FnOnce(&TextFormatter, &mut Vec<u8>) -> std::io::Result<()>,
    {
        let formatter = TextFormatter::with_color(verbosity, false);
        let mut out = Vec::new();
        f(&formatter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn packages() -> Vec<Package> {
        vec![
            Package::new("jquery")
                .with_declared("~2.1.0", DependencyType::Production)
                .with_version("2.1.4")
                .with_latest("3.0.0"),
            Package::new("angular").with_declared("1.3.x", DependencyType::Production),
            Package::new("mocha")
                .with_declared("^2.0.0", DependencyType::Development)
                .with_version("1.21.5"),
            Package::new("lodash").with_version("3.10.1"),
        ]
    }

    #[test]
    fn test_status_lists() {
        let packages = packages();
        let report = compute_status(&packages);
        let out = render(Verbosity::Normal, |f, w| f.format_status(&report, &packages, w));

        assert!(out.contains("Status: out of sync"));
        assert!(out.contains("missing: angular"));
        assert!(out.contains("untracked: lodash"));
        assert!(out.contains("out of range: mocha"));
        assert!(!out.contains("jquery"));
    }

    #[test]
    fn test_status_quiet() {
        let report = compute_status(&[]);
        let out = render(Verbosity::Quiet, |f, w| f.format_status(&report, &[], w));
        assert_eq!(out, "synced\n");
    }

    #[test]
    fn test_package_table() {
        let out = render(Verbosity::Normal, |f, w| f.format_packages(&packages(), w));

        let jquery = out.lines().find(|l| l.contains("jquery")).unwrap();
        assert!(jquery.contains("~2.1.0"));
        assert!(jquery.contains("[installed]"));
        assert!(jquery.contains("-> 3.0.0"));

        let mocha = out.lines().find(|l| l.contains("mocha")).unwrap();
        assert!(mocha.contains("[out of range]"));
        assert!(mocha.contains("🔧"));

        let lodash = out.lines().find(|l| l.contains("lodash")).unwrap();
        assert!(lodash.contains("[not tracked]"));
    }

    #[test]
    fn test_summary() {
        let mut summary = ResultSummary::new();
        summary.add(
            "jquery",
            AffectedPackage {
                version: Some("2.1.4".to_string()),
                directory: None,
            },
        );
        let out = render(Verbosity::Normal, |f, w| f.format_summary("install", &summary, w));
        assert!(out.contains("install 1 package"));
        assert!(out.contains("jquery#2.1.4"));

        let out = render(Verbosity::Quiet, |f, w| f.format_summary("install", &summary, w));
        assert!(out.is_empty());
    }

    #[test]
    fn test_info_truncates_versions() {
        let info = PackageInfo {
            name: "jquery".to_string(),
            versions: (0..15).map(|i| format!("2.{}.0", i)).collect(),
            latest_version: Some("2.14.0".to_string()),
            description: Some("JavaScript library".to_string()),
            homepage: None,
        };
        let out = render(Verbosity::Normal, |f, w| f.format_info(&info, w));
        assert!(out.starts_with("jquery 2.14.0"));
        assert!(out.contains("... and 5 more"));
    }

    #[test]
    fn test_error() {
        let error = AppError::from(CommandError::ExternalToolMissing {
            tool: "git".to_string(),
        });
        let out = render(Verbosity::Normal, |f, w| f.format_error(&error, w));
        assert_eq!(out, "Error: required tool 'git' is not installed\n");
    }
}
