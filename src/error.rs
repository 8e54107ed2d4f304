//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues with bower.json / .bowerrc reading, parsing and writing
//! - CommandError: Classified failures of the external package manager
//! - ConfigError: Issues with CLI configuration
//! - ExecutorError: The command queue went away before a task completed

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest or rc file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package manager command errors
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Command queue errors
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl AppError {
    /// Returns the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Manifest(e) => e.kind(),
            AppError::Command(e) => e.kind(),
            AppError::Config(_) => ErrorKind::Unknown,
            AppError::Executor(_) => ErrorKind::ExecutionFailed,
        }
    }
}

/// Errors related to structured file operations (bower.json, .bowerrc)
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No manifest where one was expected
    #[error("manifest file not found: {path}")]
    Absent { path: PathBuf },

    /// Manifest already exists and cannot be created again
    #[error("manifest file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// File content is not valid structured data
    #[error("failed to parse {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Failed to read file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package entry is declared in neither dependency map
    #[error("package '{name}' is not declared in {path}")]
    EntryNotFound { path: PathBuf, name: String },
}

impl ManifestError {
    /// Creates a new Absent error
    pub fn absent(path: impl Into<PathBuf>) -> Self {
        ManifestError::Absent { path: path.into() }
    }

    /// Creates a new Malformed error
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new EntryNotFound error
    pub fn entry_not_found(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        ManifestError::EntryNotFound {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Returns the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::Absent { .. } => ErrorKind::ManifestAbsent,
            ManifestError::Malformed { .. } => ErrorKind::ManifestMalformed,
            ManifestError::EntryNotFound { .. } => ErrorKind::PackageNotInstalled,
            ManifestError::AlreadyExists { .. }
            | ManifestError::ReadError { .. }
            | ManifestError::WriteError { .. } => ErrorKind::Io,
        }
    }
}

/// Kind of a failure, independent of the data it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ManifestAbsent,
    ManifestMalformed,
    PackageConflict,
    PackageNotInstalled,
    SourceNotFound,
    ResolverNotFound,
    TargetNotFound,
    ExternalToolMissing,
    ExecutionFailed,
    ConnectionReset,
    DownloadIncomplete,
    TimedOut,
    Io,
    Unknown,
}

/// Classified failure of a package manager command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command needs a manifest and there is none
    #[error("no manifest found at {path}")]
    ManifestAbsent { path: PathBuf },

    /// The tool rejected a manifest or config file
    #[error("malformed manifest or config: {message}")]
    ManifestMalformed { message: String },

    /// Requested operation conflicts with another package's constraints
    #[error("version conflict between {}: {message}", packages.join(", "))]
    PackageConflict {
        packages: Vec<String>,
        message: String,
    },

    /// Package is not installed
    #[error("{message}")]
    PackageNotInstalled {
        package: Option<String>,
        message: String,
    },

    /// Package source could not be found
    #[error("{message}")]
    SourceNotFound {
        package: Option<String>,
        message: String,
    },

    /// No resolver can handle the package source
    #[error("{message}")]
    ResolverNotFound {
        package: Option<String>,
        message: String,
    },

    /// Requested version or tag does not exist
    #[error("{message}")]
    TargetNotFound {
        package: Option<String>,
        message: String,
    },

    /// A binary the package manager depends on is missing
    #[error("required tool '{tool}' is not installed")]
    ExternalToolMissing { tool: String },

    /// The external process failed for a generic reason
    #[error("command '{command}' failed: {message}")]
    ExecutionFailed { command: String, message: String },

    /// The connection was reset while fetching
    #[error("connection reset: {message}")]
    ConnectionReset { message: String },

    /// A download ended before completion
    #[error("download incomplete: {message}")]
    DownloadIncomplete { message: String },

    /// The command exceeded the configured timeout
    #[error("command '{command}' timed out: {message}")]
    TimedOut { command: String, message: String },

    /// Unclassified error code
    #[error("unexpected error ({code}): {message}")]
    Unknown { code: String, message: String },
}

impl CommandError {
    /// Creates a new ExecutionFailed error
    pub fn execution_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        CommandError::ExecutionFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::ManifestAbsent { .. } => ErrorKind::ManifestAbsent,
            CommandError::ManifestMalformed { .. } => ErrorKind::ManifestMalformed,
            CommandError::PackageConflict { .. } => ErrorKind::PackageConflict,
            CommandError::PackageNotInstalled { .. } => ErrorKind::PackageNotInstalled,
            CommandError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            CommandError::ResolverNotFound { .. } => ErrorKind::ResolverNotFound,
            CommandError::TargetNotFound { .. } => ErrorKind::TargetNotFound,
            CommandError::ExternalToolMissing { .. } => ErrorKind::ExternalToolMissing,
            CommandError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
            CommandError::ConnectionReset { .. } => ErrorKind::ConnectionReset,
            CommandError::DownloadIncomplete { .. } => ErrorKind::DownloadIncomplete,
            CommandError::TimedOut { .. } => ErrorKind::TimedOut,
            CommandError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Package names the error refers to, if any
    pub fn packages(&self) -> Vec<&str> {
        match self {
            CommandError::PackageConflict { packages, .. } => {
                packages.iter().map(String::as_str).collect()
            }
            CommandError::PackageNotInstalled { package, .. }
            | CommandError::SourceNotFound { package, .. }
            | CommandError::ResolverNotFound { package, .. }
            | CommandError::TargetNotFound { package, .. } => {
                package.as_deref().into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid timeout format
    #[error("invalid timeout '{value}': expected format like '90s', '5m' or '1500ms'")]
    InvalidTimeout { value: String },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },
}

/// Errors raised by the command queue itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The task was dropped before producing a result (worker stopped or task panicked)
    #[error("queued command was aborted before completion")]
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_absent() {
        let err = ManifestError::absent("/project/bower.json");
        let msg = format!("{}", err);
        assert!(msg.contains("manifest file not found"));
        assert!(msg.contains("bower.json"));
        assert_eq!(err.kind(), ErrorKind::ManifestAbsent);
    }

    #[test]
    fn test_manifest_error_malformed() {
        let err = ManifestError::malformed("bower.json", "expected value at line 1");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse bower.json"));
        assert!(msg.contains("expected value"));
        assert_eq!(err.kind(), ErrorKind::ManifestMalformed);
    }

    #[test]
    fn test_manifest_error_entry_not_found() {
        let err = ManifestError::entry_not_found("bower.json", "jquery");
        let msg = format!("{}", err);
        assert!(msg.contains("'jquery' is not declared"));
    }

    #[test]
    fn test_command_error_conflict_lists_packages() {
        let err = CommandError::PackageConflict {
            packages: vec!["angular".to_string(), "angular-route".to_string()],
            message: "Unable to find suitable version for angular".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("angular, angular-route"));
        assert_eq!(err.kind(), ErrorKind::PackageConflict);
        assert_eq!(err.packages(), vec!["angular", "angular-route"]);
    }

    #[test]
    fn test_command_error_package_names() {
        let err = CommandError::TargetNotFound {
            package: Some("jquery".to_string()),
            message: "No tag found that was able to satisfy 9.9.9".to_string(),
        };
        assert_eq!(err.packages(), vec!["jquery"]);

        let err = CommandError::ConnectionReset {
            message: "socket hang up".to_string(),
        };
        assert!(err.packages().is_empty());
    }

    #[test]
    fn test_command_error_tool_missing() {
        let err = CommandError::ExternalToolMissing {
            tool: "git".to_string(),
        };
        assert!(format!("{}", err).contains("'git' is not installed"));
        assert_eq!(err.kind(), ErrorKind::ExternalToolMissing);
    }

    #[test]
    fn test_config_error_invalid_timeout() {
        let err = ConfigError::InvalidTimeout {
            value: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("invalid timeout"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let app_err: AppError = ManifestError::absent("/path").into();
        assert!(format!("{}", app_err).contains("manifest file not found"));
        assert_eq!(app_err.kind(), ErrorKind::ManifestAbsent);
    }

    #[test]
    fn test_app_error_from_command_error() {
        let app_err: AppError = CommandError::execution_failed("install", "exit code 1").into();
        assert!(format!("{}", app_err).contains("command 'install' failed"));
        assert_eq!(app_err.kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_app_error_from_executor_error() {
        let app_err: AppError = ExecutorError::Aborted.into();
        assert!(format!("{}", app_err).contains("aborted"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = ManifestError::absent("/test");
        let debug = format!("{:?}", err);
        assert!(debug.contains("Absent"));
    }
}
