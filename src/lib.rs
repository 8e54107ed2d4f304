//! bowersync - Bower project dependency manager library
//!
//! This library keeps a Bower project's installed packages in sync with its
//! manifest:
//! - Serial command queue in front of the external `bower` process
//! - Package registry merged from bower.json, the install directory and the cache
//! - Sync status (missing / untracked / out-of-range packages)
//! - bower.json reconciliation and external change detection

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod executor;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod package_manager;
pub mod package_registry;
pub mod progress;
pub mod project;
pub mod status;

pub use config::ProjectConfig;
pub use error::{AppError, ErrorKind};
pub use events::ProjectEvent;
pub use project::{InstallOptions, ProjectContext};
