//! Project synchronization status
//!
//! This module provides:
//! - `compute_status`, a pure classification of a package set
//! - `SyncStatusEngine`, which keeps the last result and emits
//!   `StatusChanged` only when the status value moves

use crate::domain::{Package, PackageStatus, SyncStatus};
use crate::events::{EventBus, ProjectEvent};
use serde::{Serialize, Serializer};
use tracing::info;

/// Classification of a package set
///
/// Serializes the package lists as names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatusReport {
    pub status: SyncStatus,
    /// Declared but not installed
    #[serde(serialize_with = "serialize_names")]
    pub missing: Vec<Package>,
    /// Installed but not declared
    #[serde(serialize_with = "serialize_names")]
    pub untracked: Vec<Package>,
    /// Installed version outside the declared range
    #[serde(serialize_with = "serialize_names")]
    pub version_out_of_sync: Vec<Package>,
}

impl StatusReport {
    pub fn is_synced(&self) -> bool {
        self.status == SyncStatus::Synced
    }
}

/// Names of `packages`, in order
pub fn package_names(packages: &[Package]) -> Vec<&str> {
    packages.iter().map(|p| p.name.as_str()).collect()
}

fn serialize_names<S: Serializer>(packages: &[Package], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(packages.iter().map(|p| &p.name))
}

/// Classify `packages`; lists follow the iteration order of the input
pub fn compute_status(packages: &[Package]) -> StatusReport {
    let mut report = StatusReport::default();
    for package in packages {
        match package.status() {
            Some(PackageStatus::Missing) => report.missing.push(package.clone()),
            Some(PackageStatus::NotTracked) => report.untracked.push(package.clone()),
            Some(PackageStatus::Installed) if package.is_version_out_of_sync() => {
                report.version_out_of_sync.push(package.clone())
            }
            _ => {}
        }
    }
    report.status = if report.missing.is_empty()
        && report.untracked.is_empty()
        && report.version_out_of_sync.is_empty()
    {
        SyncStatus::Synced
    } else {
        SyncStatus::OutOfSync
    };
    report
}

/// Holds the current status and notifies on change
#[derive(Debug)]
pub struct SyncStatusEngine {
    current: StatusReport,
    events: EventBus,
}

impl SyncStatusEngine {
    pub fn new(events: EventBus) -> Self {
        Self {
            current: StatusReport::default(),
            events,
        }
    }

    /// Recompute from `packages`; returns true when the status value changed
    pub fn recompute(&mut self, packages: &[Package]) -> bool {
        let report = compute_status(packages);
        let changed = report.status != self.current.status;
        if changed {
            info!(from = %self.current.status, to = %report.status, "sync status changed");
        }
        self.current = report;
        if changed {
            self.events.emit(ProjectEvent::StatusChanged);
        }
        changed
    }

    /// Last computed report
    pub fn report(&self) -> &StatusReport {
        &self.current
    }

    /// Last computed status, `Unknown` before the first computation
    pub fn status(&self) -> SyncStatus {
        self.current.status
    }

    /// Back to `Unknown`, e.g. when the project can no longer be read
    pub fn reset(&mut self) {
        if self.current.status != SyncStatus::Unknown {
            self.current = StatusReport::default();
            self.events.emit(ProjectEvent::StatusChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyType;

    fn installed(name: &str, declared: &str, version: &str) -> Package {
        Package::new(name)
            .with_declared(declared, DependencyType::Production)
            .with_version(version)
    }

    #[test]
    fn test_synced_when_all_match() {
        let report = compute_status(&[
            installed("jquery", "~2.1.0", "2.1.4"),
            installed("angular", "1.3.x", "1.3.20"),
        ]);
        assert_eq!(report.status, SyncStatus::Synced);
        assert!(report.is_synced());
    }

    #[test]
    fn test_empty_set_is_synced() {
        assert_eq!(compute_status(&[]).status, SyncStatus::Synced);
    }

    #[test]
    fn test_classification_lists() {
        let report = compute_status(&[
            Package::new("lodash").with_version("3.10.1"),
            Package::new("angular").with_declared("1.3.x", DependencyType::Production),
            installed("jquery", "~2.1.0", "1.11.3"),
            installed("bootstrap", "https://github.com/twbs/bootstrap.git", "3.3.5"),
            Package::new("moment").with_version("2.10.6"),
        ]);

        assert_eq!(report.status, SyncStatus::OutOfSync);
        assert_eq!(package_names(&report.missing), vec!["angular"]);
        assert_eq!(package_names(&report.untracked), vec!["lodash", "moment"]);
        assert_eq!(package_names(&report.version_out_of_sync), vec!["jquery"]);
        assert_eq!(report.version_out_of_sync[0].version.as_deref(), Some("1.11.3"));
    }

    #[test]
    fn test_notifies_only_on_change() {
        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let mut engine = SyncStatusEngine::new(events);
        assert_eq!(engine.status(), SyncStatus::Unknown);

        let synced = vec![installed("jquery", "~2.1.0", "2.1.4")];
        assert!(engine.recompute(&synced));
        assert!(!engine.recompute(&synced));

        // Different lists, same status value: no notification
        let drifted = vec![Package::new("lodash").with_version("3.10.1")];
        assert!(engine.recompute(&drifted));
        let drifted_more = vec![
            Package::new("lodash").with_version("3.10.1"),
            Package::new("moment").with_version("2.10.6"),
        ];
        assert!(!engine.recompute(&drifted_more));
        assert_eq!(package_names(&engine.report().untracked), vec!["lodash", "moment"]);

        assert_eq!(receiver.try_recv().unwrap(), ProjectEvent::StatusChanged);
        assert_eq!(receiver.try_recv().unwrap(), ProjectEvent::StatusChanged);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_reset() {
        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let mut engine = SyncStatusEngine::new(events);

        engine.reset();
        assert!(receiver.try_recv().is_err());

        engine.recompute(&[]);
        engine.reset();
        assert_eq!(engine.status(), SyncStatus::Unknown);
        assert_eq!(receiver.try_recv().unwrap(), ProjectEvent::StatusChanged);
        assert_eq!(receiver.try_recv().unwrap(), ProjectEvent::StatusChanged);
    }
}
