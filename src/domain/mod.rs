//! Core domain models for bowersync
//!
//! This module contains the fundamental types used throughout the application:
//! - Package entities and their derived status
//! - Version range matching for declared dependencies
//! - Aggregate synchronization status
//! - Command result summaries

mod command_result;
mod package;
mod sync_status;
mod version_range;

pub use command_result::{AffectedPackage, ResultSummary};
pub use package::{DependencyType, Package, PackageStatus};
pub use sync_status::SyncStatus;
pub use version_range::VersionRange;
