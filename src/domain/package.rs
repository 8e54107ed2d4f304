//! Package entity tracked for a project

use super::VersionRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which manifest map a package is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Declared under `dependencies`
    Production,
    /// Declared under `devDependencies`
    Development,
    /// Not declared (installed only)
    #[default]
    Unknown,
}

impl DependencyType {
    /// Manifest key holding dependencies of this type
    pub fn manifest_key(&self) -> &'static str {
        match self {
            DependencyType::Development => "devDependencies",
            DependencyType::Production | DependencyType::Unknown => "dependencies",
        }
    }
}

/// Installation status derived from declared and installed versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// Declared and installed
    Installed,
    /// Declared but not installed
    Missing,
    /// Installed but not declared
    NotTracked,
}

impl PackageStatus {
    /// Returns the display label
    pub fn label(&self) -> &'static str {
        match self {
            PackageStatus::Installed => "installed",
            PackageStatus::Missing => "missing",
            PackageStatus::NotTracked => "not tracked",
        }
    }
}

/// A project dependency as seen from manifest, install directory and cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name, unique within a project
    pub name: String,
    /// Installed version
    pub version: Option<String>,
    /// Latest version known to the registry
    pub latest_version: Option<String>,
    /// Version range as written in the manifest
    pub declared_version: Option<String>,
    /// Manifest map the package is declared in
    pub dependency_type: DependencyType,
    /// Versions of this package present in the local cache
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cached_versions: Vec<String>,
}

impl Package {
    /// Creates a package with no version information
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            latest_version: None,
            declared_version: None,
            dependency_type: DependencyType::Unknown,
            cached_versions: Vec::new(),
        }
    }

    /// Sets the installed version (builder pattern)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the declared range and dependency type (builder pattern)
    pub fn with_declared(
        mut self,
        declared: impl Into<String>,
        dependency_type: DependencyType,
    ) -> Self {
        self.declared_version = Some(declared.into());
        self.dependency_type = dependency_type;
        self
    }

    /// Sets the latest known version (builder pattern)
    pub fn with_latest(mut self, latest: impl Into<String>) -> Self {
        self.latest_version = Some(latest.into());
        self
    }

    /// Derives the status from declared and installed versions.
    ///
    /// Returns `None` for a package that is neither declared nor installed.
    pub fn status(&self) -> Option<PackageStatus> {
        match (&self.declared_version, &self.version) {
            (Some(_), Some(_)) => Some(PackageStatus::Installed),
            (Some(_), None) => Some(PackageStatus::Missing),
            (None, Some(_)) => Some(PackageStatus::NotTracked),
            (None, None) => None,
        }
    }

    /// Returns true if the package belongs in `dependencies`
    pub fn is_production_dependency(&self) -> bool {
        self.dependency_type != DependencyType::Development
    }

    /// Returns true if the installed version does not satisfy the declared range.
    ///
    /// Declared values that are not ranges (urls, branches, tags) and installed
    /// versions that are not semver never count as out of sync.
    pub fn is_version_out_of_sync(&self) -> bool {
        if self.status() != Some(PackageStatus::Installed) {
            return false;
        }
        let (Some(declared), Some(installed)) = (&self.declared_version, &self.version) else {
            return false;
        };
        match VersionRange::parse(declared) {
            Some(range) => range.satisfied_by(installed) == Some(false),
            None => false,
        }
    }

    /// Returns true if the registry knows a newer version than the installed one
    pub fn has_update(&self) -> bool {
        let (Some(installed), Some(latest)) = (&self.version, &self.latest_version) else {
            return false;
        };
        match (
            VersionRange::parse_version(installed),
            VersionRange::parse_version(latest),
        ) {
            (Some(installed), Some(latest)) => latest > installed,
            _ => false,
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ref version) = self.version {
            write!(f, "@{}", version)?;
        }
        if let Some(ref declared) = self.declared_version {
            write!(f, " ({})", declared)?;
        }
        if self.dependency_type == DependencyType::Development {
            write!(f, " (dev)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_package() {
        let pkg = Package::new("jquery").with_declared("1.0.0", DependencyType::Production);
        assert_eq!(pkg.status(), Some(PackageStatus::Missing));
        assert!(!pkg.is_version_out_of_sync());
    }

    #[test]
    fn test_not_tracked_package() {
        let pkg = Package::new("jquery").with_version("1.0.0");
        assert_eq!(pkg.status(), Some(PackageStatus::NotTracked));
        assert!(!pkg.is_version_out_of_sync());
    }

    #[test]
    fn test_installed_compatible_package() {
        let pkg = Package::new("jquery")
            .with_declared("1.0.0", DependencyType::Production)
            .with_version("1.0.0");
        assert_eq!(pkg.status(), Some(PackageStatus::Installed));
        assert!(!pkg.is_version_out_of_sync());
    }

    #[test]
    fn test_installed_incompatible_package() {
        let pkg = Package::new("angular")
            .with_declared("~1.2.0", DependencyType::Production)
            .with_version("1.3.1");
        assert_eq!(pkg.status(), Some(PackageStatus::Installed));
        assert!(pkg.is_version_out_of_sync());
    }

    #[test]
    fn test_url_declaration_never_out_of_sync() {
        let pkg = Package::new("fork")
            .with_declared("https://github.com/me/fork.git", DependencyType::Production)
            .with_version("0.0.1");
        assert!(!pkg.is_version_out_of_sync());
    }

    #[test]
    fn test_unknown_type_is_production() {
        let pkg = Package::new("a").with_version("1.0.0");
        assert!(pkg.is_production_dependency());

        let dev = Package::new("b").with_declared("^1.0.0", DependencyType::Development);
        assert!(!dev.is_production_dependency());
    }

    #[test]
    fn test_has_update() {
        let pkg = Package::new("lodash")
            .with_version("4.17.0")
            .with_latest("4.17.21");
        assert!(pkg.has_update());

        let current = Package::new("lodash")
            .with_version("4.17.21")
            .with_latest("4.17.21");
        assert!(!current.has_update());
    }

    #[test]
    fn test_package_display() {
        let pkg = Package::new("mocha")
            .with_declared("^2.0.0", DependencyType::Development)
            .with_version("2.1.0");
        assert_eq!(format!("{}", pkg), "mocha@2.1.0 (^2.0.0) (dev)");
    }

    #[test]
    fn test_dependency_type_manifest_key() {
        assert_eq!(DependencyType::Production.manifest_key(), "dependencies");
        assert_eq!(DependencyType::Development.manifest_key(), "devDependencies");
        assert_eq!(DependencyType::Unknown.manifest_key(), "dependencies");
    }

    #[test]
    fn test_serde_package() {
        let pkg = Package::new("jquery")
            .with_declared("~2.1.0", DependencyType::Production)
            .with_version("2.1.4");
        let json = serde_json::to_string(&pkg).unwrap();
        assert!(json.contains("\"dependency_type\":\"production\""));
        let parsed: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pkg);
    }
}
