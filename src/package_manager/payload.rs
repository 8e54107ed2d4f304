//! Typed payloads of package manager commands
//!
//! Every command's JSON output is parsed into one closed variant of
//! `CommandOutput` instead of being passed around as an untyped value.

use super::{BowerCommand, OptionMap};
use crate::domain::{AffectedPackage, ResultSummary};
use crate::error::CommandError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A package written by install or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Option<String>,
    /// Requested target (range, tag or commit)
    pub target: Option<String>,
    pub directory: Option<PathBuf>,
}

/// A package deleted by uninstall or prune
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedPackage {
    pub name: String,
    pub directory: Option<PathBuf>,
}

/// One top-level entry of the project listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedPackage {
    pub name: String,
    /// Installed version; `None` when the package is missing from disk
    pub version: Option<String>,
    /// Latest version the registry offers
    pub latest_version: Option<String>,
    pub target: Option<String>,
    pub missing: bool,
    pub extraneous: bool,
}

/// Result of `list`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProjectListing {
    /// Name of the project root package
    pub name: Option<String>,
    /// Direct dependencies, in the order the tool reported them
    pub packages: Vec<ListedPackage>,
}

/// One registry search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Result of `info`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PackageInfo {
    pub name: String,
    /// Published versions, newest first
    pub versions: Vec<String>,
    pub latest_version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

/// A package version present in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub name: String,
    pub version: Option<String>,
}

/// Parsed output of one command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// install / update
    Installed(Vec<InstalledPackage>),
    /// uninstall / prune
    Removed(Vec<RemovedPackage>),
    /// list
    Listing(ProjectListing),
    /// search
    Search(Vec<SearchHit>),
    /// info
    Info(PackageInfo),
    /// cache list
    Cache(Vec<CacheEntry>),
    /// getConfiguration
    Configuration(OptionMap),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPkgMeta {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawEndpoint {
    name: Option<String>,
    target: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawInstallEntry {
    endpoint: RawEndpoint,
    canonical_dir: Option<String>,
    pkg_meta: RawPkgMeta,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawUpdate {
    latest: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawListNode {
    endpoint: RawEndpoint,
    pkg_meta: RawPkgMeta,
    missing: bool,
    extraneous: bool,
    update: Option<RawUpdate>,
    dependencies: Map<String, Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawInfo {
    name: Option<String>,
    version: Option<String>,
    versions: Vec<String>,
    latest: Option<RawPkgMeta>,
    description: Option<String>,
    homepage: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawCacheEntry {
    endpoint: RawEndpoint,
    pkg_meta: RawPkgMeta,
}

impl CommandOutput {
    /// Parses the raw JSON payload of `command`
    pub fn parse(command: BowerCommand, value: Value) -> Result<Self, CommandError> {
        match command {
            BowerCommand::Install | BowerCommand::Update => {
                let entries: Map<String, Value> = decode(command, null_as_object(value))?;
                let mut installed = Vec::with_capacity(entries.len());
                for (name, entry) in entries {
                    let entry: RawInstallEntry = decode(command, entry)?;
                    installed.push(InstalledPackage {
                        name,
                        version: entry.pkg_meta.version,
                        target: entry.endpoint.target,
                        directory: entry.canonical_dir.map(PathBuf::from),
                    });
                }
                Ok(CommandOutput::Installed(installed))
            }
            BowerCommand::Uninstall | BowerCommand::Prune => {
                let entries: Map<String, Value> = decode(command, null_as_object(value))?;
                let removed = entries
                    .into_iter()
                    .map(|(name, dir)| RemovedPackage {
                        name,
                        directory: dir.as_str().map(PathBuf::from),
                    })
                    .collect();
                Ok(CommandOutput::Removed(removed))
            }
            BowerCommand::List => {
                let root: RawListNode = decode(command, null_as_object(value))?;
                let mut packages = Vec::with_capacity(root.dependencies.len());
                for (name, node) in root.dependencies {
                    let node: RawListNode = decode(command, node)?;
                    packages.push(ListedPackage {
                        name,
                        version: if node.missing {
                            None
                        } else {
                            node.pkg_meta.version
                        },
                        latest_version: node.update.and_then(|u| u.latest),
                        target: node.endpoint.target,
                        missing: node.missing,
                        extraneous: node.extraneous,
                    });
                }
                Ok(CommandOutput::Listing(ProjectListing {
                    name: root.pkg_meta.name,
                    packages,
                }))
            }
            BowerCommand::Search => {
                let hits: Vec<SearchHit> = decode(command, null_as_array(value))?;
                Ok(CommandOutput::Search(hits))
            }
            BowerCommand::Info => {
                let raw: RawInfo = decode(command, value)?;
                let (latest_version, description, homepage) = match raw.latest {
                    Some(latest) => (
                        latest.version,
                        latest.description.or(raw.description),
                        latest.homepage.or(raw.homepage),
                    ),
                    // `info name#version` answers with the package metadata itself
                    None => (raw.version.clone(), raw.description, raw.homepage),
                };
                let versions = if raw.versions.is_empty() {
                    raw.version.into_iter().collect()
                } else {
                    raw.versions
                };
                Ok(CommandOutput::Info(PackageInfo {
                    name: raw.name.unwrap_or_default(),
                    versions,
                    latest_version,
                    description,
                    homepage,
                }))
            }
            BowerCommand::CacheList => {
                let raw: Vec<RawCacheEntry> = decode(command, null_as_array(value))?;
                let entries = raw
                    .into_iter()
                    .filter_map(|entry| {
                        let name = entry.pkg_meta.name.or(entry.endpoint.name)?;
                        Some(CacheEntry {
                            name,
                            version: entry.pkg_meta.version,
                        })
                    })
                    .collect();
                Ok(CommandOutput::Cache(entries))
            }
            BowerCommand::GetConfiguration => {
                let config: OptionMap = decode(command, null_as_object(value))?;
                Ok(CommandOutput::Configuration(config))
            }
        }
    }

    /// Summary of affected packages for mutating commands
    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary::new();
        match self {
            CommandOutput::Installed(installed) => {
                for package in installed {
                    summary.add(
                        &package.name,
                        AffectedPackage {
                            version: package.version.clone(),
                            directory: package.directory.clone(),
                        },
                    );
                }
            }
            CommandOutput::Removed(removed) => {
                for package in removed {
                    summary.add(
                        &package.name,
                        AffectedPackage {
                            version: None,
                            directory: package.directory.clone(),
                        },
                    );
                }
            }
            _ => {}
        }
        summary
    }

    /// Variant name, for error messages
    fn variant(&self) -> &'static str {
        match self {
            CommandOutput::Installed(_) => "installed",
            CommandOutput::Removed(_) => "removed",
            CommandOutput::Listing(_) => "listing",
            CommandOutput::Search(_) => "search",
            CommandOutput::Info(_) => "info",
            CommandOutput::Cache(_) => "cache",
            CommandOutput::Configuration(_) => "configuration",
        }
    }

    /// Error for a payload of the wrong variant
    pub fn unexpected(&self, command: BowerCommand) -> CommandError {
        CommandError::execution_failed(
            command.name(),
            format!("unexpected {} output", self.variant()),
        )
    }
}

fn decode<T: DeserializeOwned>(command: BowerCommand, value: Value) -> Result<T, CommandError> {
    serde_json::from_value(value).map_err(|e| {
        CommandError::execution_failed(command.name(), format!("unreadable output: {}", e))
    })
}

fn null_as_object(value: Value) -> Value {
    if value.is_null() {
        Value::Object(Map::new())
    } else {
        value
    }
}

fn null_as_array(value: Value) -> Value {
    if value.is_null() {
        Value::Array(Vec::new())
    } else {
        value
    }
}
