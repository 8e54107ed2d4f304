//! Result summaries returned by the upward command surface

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One package touched by a command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AffectedPackage {
    /// Version after the command (install/update)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Directory the package was installed into or removed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Outcome of install / uninstall / update / prune
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Number of packages affected
    pub count: usize,
    /// Affected packages by name
    pub packages: BTreeMap<String, AffectedPackage>,
}

impl ResultSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an affected package
    pub fn add(&mut self, name: impl Into<String>, package: AffectedPackage) {
        self.packages.insert(name.into(), package);
        self.count = self.packages.len();
    }

    /// Returns true if nothing was affected
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_unique_names() {
        let mut summary = ResultSummary::new();
        assert!(summary.is_empty());

        summary.add(
            "jquery",
            AffectedPackage {
                version: Some("2.1.4".to_string()),
                directory: None,
            },
        );
        summary.add("jquery", AffectedPackage::default());
        summary.add("lodash", AffectedPackage::default());

        assert_eq!(summary.count, 2);
        assert!(summary.packages.contains_key("lodash"));
    }
}
