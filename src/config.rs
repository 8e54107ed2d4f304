//! Project configuration
//!
//! Resolves command-line settings and the project's `.bowerrc` into the
//! values the package manager is invoked with.

use crate::cli::CliArgs;
use crate::error::ConfigError;
use crate::manifest::RcDocument;
use crate::package_manager::{BowerCommand, OptionMap};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Binary looked up on PATH when none is configured
pub const DEFAULT_BOWER_BINARY: &str = "bower";

/// Settings of one project session
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Directory containing bower.json
    pub project_dir: PathBuf,
    /// Package manager executable
    pub bower_binary: PathBuf,
    /// Kill a command that runs longer than this; `None` waits forever
    pub command_timeout: Option<Duration>,
    /// Resolve from the local cache only
    pub offline: bool,
    /// Pick the latest version on conflicts instead of failing
    pub force_latest: bool,
    /// Skip devDependencies when installing from the manifest
    pub production: bool,
}

impl ProjectConfig {
    /// Defaults for `project_dir`
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            bower_binary: PathBuf::from(DEFAULT_BOWER_BINARY),
            command_timeout: None,
            offline: false,
            force_latest: false,
            production: false,
        }
    }

    /// Build from parsed command-line arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let config = Self {
            project_dir: args.cwd.clone(),
            bower_binary: args.bower.clone(),
            command_timeout: args.timeout,
            offline: args.offline,
            force_latest: args.force_latest,
            production: args.production,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the command timeout (builder pattern)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Check that the project directory is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.project_dir.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: self.project_dir.clone(),
                message: "not a directory".to_string(),
            });
        }
        Ok(())
    }

    /// Directory the package manager runs in, honouring `cwd` from .bowerrc
    pub fn working_dir(&self, rc: Option<&RcDocument>) -> PathBuf {
        match rc.and_then(RcDocument::cwd) {
            Some(cwd) => self.project_dir.join(cwd),
            None => self.project_dir.clone(),
        }
    }

    /// Config map handed to every command: .bowerrc plus session flags
    pub fn runner_config(&self, rc: Option<&RcDocument>) -> OptionMap {
        let mut config = rc.map(RcDocument::to_config_map).unwrap_or_default();
        // cwd is applied as the process working directory
        config.remove("cwd");
        if self.offline {
            config.insert("offline".to_string(), Value::Bool(true));
        }
        config
    }

    /// Command-line options for `command` derived from session flags
    pub fn command_options(&self, command: BowerCommand) -> OptionMap {
        let mut options = OptionMap::new();
        match command {
            BowerCommand::Install | BowerCommand::Update => {
                if self.force_latest {
                    options.insert("force-latest".to_string(), Value::Bool(true));
                }
                if self.production {
                    options.insert("production".to_string(), Value::Bool(true));
                }
            }
            BowerCommand::Prune if self.production => {
                options.insert("production".to_string(), Value::Bool(true));
            }
            _ => {}
        }
        options
    }
}
