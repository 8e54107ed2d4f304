//! CLI argument parsing module for bowersync

use crate::error::ConfigError;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Parse timeout string in format: Nms, Ns, Nm, Nh
fn parse_timeout(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTimeout {
        value: s.to_string(),
    };
    let s = s.trim();

    let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, "ms")
    } else if let Some(n) = s.strip_suffix('s') {
        (n, "s")
    } else if let Some(n) = s.strip_suffix('m') {
        (n, "m")
    } else if let Some(n) = s.strip_suffix('h') {
        (n, "h")
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    if num == 0 {
        return Err(invalid());
    }

    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(num)),
        "s" => Some(num),
        "m" => num.checked_mul(60),
        _ => num.checked_mul(60 * 60),
    };
    secs.map(Duration::from_secs).ok_or_else(invalid)
}

/// Keeps a Bower project's installed packages in sync with bower.json
#[derive(Parser, Debug, Clone)]
#[command(name = "bowersync", version, about = "Bower project dependency manager")]
pub struct CliArgs {
    /// Project directory (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    pub cwd: PathBuf,

    /// Bower executable to run
    #[arg(long, global = true, default_value = "bower")]
    pub bower: PathBuf,

    /// Kill a bower command after this long (e.g., 90s, 5m, 1500ms)
    #[arg(long, global = true, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Resolve packages from the local cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Resolve version conflicts with the latest version
    #[arg(long, global = true)]
    pub force_latest: bool,

    /// Skip devDependencies
    #[arg(long, global = true)]
    pub production: bool,

    // Output options
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output (repeat for debug logs)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Project commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the synchronization status (default)
    Status,
    /// List packages with declared, installed and latest versions
    List,
    /// Install a package, or everything bower.json declares
    Install(InstallArgs),
    /// Uninstall a package and remove it from bower.json
    Uninstall {
        /// Package name
        name: String,
        /// Remove even if other packages depend on it
        #[arg(short, long)]
        force: bool,
    },
    /// Update one package, or all of them
    Update {
        /// Package name
        name: Option<String>,
    },
    /// Remove extraneous packages
    Prune,
    /// Search the registry
    Search {
        /// Search query
        query: String,
    },
    /// Show registry information for a package
    Info {
        /// Package name
        name: String,
    },
    /// Create bower.json from the installed packages
    Init,
    /// Delete bower.json
    RemoveManifest,
    /// Change the declared range or dependency type of a bower.json entry
    Entry(EntryArgs),
    /// Show the effective bower configuration
    Config,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct InstallArgs {
    /// Package name; installs from bower.json when omitted
    pub name: Option<String>,

    /// Version range or tag to install
    #[arg(long, requires = "name")]
    pub range: Option<String>,

    /// Save to dependencies
    #[arg(short = 'S', long, requires = "name", conflicts_with = "save_dev")]
    pub save: bool,

    /// Save to devDependencies
    #[arg(short = 'D', long, requires = "name")]
    pub save_dev: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EntryArgs {
    /// Package name
    pub name: String,

    /// New declared range
    #[arg(long)]
    pub range: Option<String>,

    /// Move to devDependencies
    #[arg(long, conflicts_with = "prod")]
    pub dev: bool,

    /// Move to dependencies
    #[arg(long)]
    pub prod: bool,
}

impl CliArgs {
    /// The subcommand to run, `status` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }
}
