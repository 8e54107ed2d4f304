//! Aggregate synchronization status of a project

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether installed packages match the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Every declared package is installed at a matching version and nothing extra is installed
    Synced,
    /// At least one package is missing, untracked or out of range
    OutOfSync,
    /// Not computed yet
    #[default]
    Unknown,
}

impl SyncStatus {
    /// Returns the display label
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::OutOfSync => "out of sync",
            SyncStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(SyncStatus::default(), SyncStatus::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SyncStatus::OutOfSync), "out of sync");
    }

    #[test]
    fn test_serde_sync_status() {
        let json = serde_json::to_string(&SyncStatus::OutOfSync).unwrap();
        assert_eq!(json, "\"out_of_sync\"");
    }
}
