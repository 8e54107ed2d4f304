//! Integration with the external Bower process
//!
//! This module provides:
//! - The `PackageManagerRunner` contract every command goes through
//! - A system runner spawning the `bower` binary with JSON output
//! - Typed payloads per command and the error-code classifier

mod classifier;
mod payload;
mod system;

pub use classifier::classify;
pub use payload::{
    CacheEntry, CommandOutput, InstalledPackage, ListedPackage, PackageInfo, ProjectListing,
    RemovedPackage, SearchHit,
};
pub use system::SystemPackageManager;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Option / config map handed to the package manager
pub type OptionMap = Map<String, Value>;

/// Commands the crate issues against the package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BowerCommand {
    Install,
    Uninstall,
    Update,
    Prune,
    List,
    Search,
    Info,
    CacheList,
    GetConfiguration,
}

impl BowerCommand {
    /// Name of the command as the package manager knows it
    pub fn name(&self) -> &'static str {
        match self {
            BowerCommand::Install => "install",
            BowerCommand::Uninstall => "uninstall",
            BowerCommand::Update => "update",
            BowerCommand::Prune => "prune",
            BowerCommand::List => "list",
            BowerCommand::Search => "search",
            BowerCommand::Info => "info",
            BowerCommand::CacheList => "cache list",
            BowerCommand::GetConfiguration => "getConfiguration",
        }
    }
}

impl fmt::Display for BowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error code used when a command exceeds the configured timeout; the tool's
/// own `ETIMEDOUT` is a network failure and stays unclassified
pub const COMMAND_TIMEOUT_CODE: &str = "ECMDTIMEOUT";

/// Raw structured error reported by the package manager
#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    /// Error code such as `ENOTFOUND` or `ECONFLICT`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional structured details (e.g. conflict picks)
    pub details: Value,
}

impl ToolError {
    /// Creates an error without details
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Value::Null,
        }
    }

    /// Attaches structured details (builder pattern)
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Executes package manager commands out of process
#[async_trait]
pub trait PackageManagerRunner: Send + Sync {
    /// Run `command` with positional `args`, command `options` and tool `config`
    async fn execute(
        &self,
        command: BowerCommand,
        args: &[String],
        options: &OptionMap,
        config: &OptionMap,
    ) -> Result<Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(BowerCommand::Install.name(), "install");
        assert_eq!(BowerCommand::CacheList.name(), "cache list");
        assert_eq!(format!("{}", BowerCommand::Prune), "prune");
    }

    #[test]
    fn test_tool_error_builder() {
        let err = ToolError::new("ECONFLICT", "Unable to find suitable version")
            .with_details(serde_json::json!({"name": "angular"}));
        assert_eq!(err.code, "ECONFLICT");
        assert_eq!(err.details["name"], "angular");
    }
}
