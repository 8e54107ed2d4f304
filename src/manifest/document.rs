//! bower.json document
//!
//! The document keeps the whole top-level object so unrelated metadata (`name`,
//! `main`, `ignore`, ...) and key order survive every rewrite. Only the
//! `dependencies` and `devDependencies` maps are interpreted.

use super::StructuredFile;
use crate::domain::{DependencyType, Package};
use crate::error::ManifestError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

const DEPENDENCIES: &str = "dependencies";
const DEV_DEPENDENCIES: &str = "devDependencies";

/// Declared dependencies of a manifest, compared by value regardless of key order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencySnapshot {
    /// Production dependencies
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies
    pub dev_dependencies: BTreeMap<String, String>,
}

/// One entry of a dependency map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Package name
    pub name: String,
    /// Declared range
    pub range: String,
    /// Which map it lives in
    pub dependency_type: DependencyType,
}

/// Parsed bower.json
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    object: Map<String, Value>,
}

impl StructuredFile for ManifestDocument {
    const FILE_NAME: &'static str = "bower.json";

    fn from_object(object: Map<String, Value>) -> Result<Self, String> {
        for key in [DEPENDENCIES, DEV_DEPENDENCIES] {
            match object.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::Object(entries)) => {
                    if let Some((name, _)) = entries.iter().find(|(_, v)| !v.is_string()) {
                        return Err(format!("{}.{} must be a version string", key, name));
                    }
                }
                Some(_) => return Err(format!("'{}' must be an object", key)),
            }
        }
        Ok(Self { object })
    }

    fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }
}

impl ManifestDocument {
    /// Creates a manifest containing only a `name` field
    pub fn new(name: impl Into<String>) -> Self {
        let mut object = Map::new();
        object.insert("name".to_string(), Value::String(name.into()));
        Self { object }
    }

    /// Builds a manifest declaring every package of the current set.
    ///
    /// The declared range is kept when present; otherwise the installed version
    /// is declared with a `~` prefix. Packages with neither are skipped.
    pub fn from_packages(name: impl Into<String>, packages: &[Package]) -> Self {
        let mut doc = Self::new(name);
        doc.object
            .insert(DEPENDENCIES.to_string(), Value::Object(Map::new()));
        doc.object
            .insert(DEV_DEPENDENCIES.to_string(), Value::Object(Map::new()));

        for package in packages {
            let range = match (&package.declared_version, &package.version) {
                (Some(declared), _) => declared.clone(),
                (None, Some(installed)) => format!("~{}", installed),
                (None, None) => continue,
            };
            let dependency_type = if package.is_production_dependency() {
                DependencyType::Production
            } else {
                DependencyType::Development
            };
            doc.set_entry(&package.name, range, dependency_type);
        }
        doc
    }

    /// Project name from the manifest
    pub fn name(&self) -> Option<&str> {
        self.object.get("name").and_then(Value::as_str)
    }

    /// All declared dependencies, `dependencies` first, in document order
    pub fn declared(&self) -> Vec<DeclaredDependency> {
        let mut declared = Vec::new();
        for (key, dependency_type) in [
            (DEPENDENCIES, DependencyType::Production),
            (DEV_DEPENDENCIES, DependencyType::Development),
        ] {
            if let Some(entries) = self.object.get(key).and_then(Value::as_object) {
                for (name, range) in entries {
                    declared.push(DeclaredDependency {
                        name: name.clone(),
                        range: range.as_str().unwrap_or_default().to_string(),
                        dependency_type,
                    });
                }
            }
        }
        declared
    }

    /// Value snapshot of both dependency maps
    pub fn snapshot(&self) -> DependencySnapshot {
        let collect = |key: &str| -> BTreeMap<String, String> {
            self.object
                .get(key)
                .and_then(Value::as_object)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                        .collect()
                })
                .unwrap_or_default()
        };
        DependencySnapshot {
            dependencies: collect(DEPENDENCIES),
            dev_dependencies: collect(DEV_DEPENDENCIES),
        }
    }

    /// Looks up a declared entry
    pub fn entry(&self, name: &str) -> Option<DeclaredDependency> {
        self.declared().into_iter().find(|d| d.name == name)
    }

    /// Declares `name` in the map for `dependency_type`, removing it from the other map
    pub fn set_entry(&mut self, name: &str, range: impl Into<String>, dependency_type: DependencyType) {
        let target = dependency_type.manifest_key();
        let other = if target == DEPENDENCIES {
            DEV_DEPENDENCIES
        } else {
            DEPENDENCIES
        };

        if let Some(entries) = self.map_mut(other, false) {
            entries.shift_remove(name);
        }
        if let Some(entries) = self.map_mut(target, true) {
            entries.insert(name.to_string(), Value::String(range.into()));
        }
    }

    /// Changes the version and/or dependency type of an existing entry.
    ///
    /// A version-only change rewrites the value in place; a type change moves
    /// the entry to the other map keeping its (possibly new) version.
    pub fn update_entry(
        &mut self,
        name: &str,
        version: Option<&str>,
        dependency_type: Option<DependencyType>,
        path: &Path,
    ) -> Result<(), ManifestError> {
        let current = self
            .entry(name)
            .ok_or_else(|| ManifestError::entry_not_found(path, name))?;

        let range = version.map(str::to_string).unwrap_or(current.range);
        let target_type = match dependency_type {
            Some(DependencyType::Unknown) | None => current.dependency_type,
            Some(t) => t,
        };

        if target_type == current.dependency_type {
            if let Some(entries) = self.map_mut(current.dependency_type.manifest_key(), false) {
                entries.insert(name.to_string(), Value::String(range));
            }
        } else {
            self.set_entry(name, range, target_type);
        }
        Ok(())
    }

    /// Removes `name` from whichever map declares it; returns whether it was declared
    pub fn remove_entry(&mut self, name: &str) -> bool {
        let mut removed = false;
        for key in [DEPENDENCIES, DEV_DEPENDENCIES] {
            if let Some(entries) = self.map_mut(key, false) {
                removed |= entries.shift_remove(name).is_some();
            }
        }
        removed
    }

    fn map_mut(&mut self, key: &str, create: bool) -> Option<&mut Map<String, Value>> {
        let missing = !matches!(self.object.get(key), Some(Value::Object(_)));
        if missing {
            if !create {
                return None;
            }
            self.object.insert(key.to_string(), Value::Object(Map::new()));
        }
        self.object.get_mut(key).and_then(Value::as_object_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> ManifestDocument {
        ManifestDocument::parse(
            r#"{
  "name": "webapp",
  "main": "index.js",
  "dependencies": {
    "jquery": "~2.1.0",
    "angular": "1.3.15"
  },
  "devDependencies": {
    "mocha": "^2.0.0"
  },
  "ignore": ["node_modules"]
}"#,
        )
        .unwrap()
    }

    fn path() -> PathBuf {
        PathBuf::from("bower.json")
    }

    #[test]
    fn test_declared_order() {
        let names: Vec<_> = sample().declared().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["jquery", "angular", "mocha"]);
    }

    #[test]
    fn test_declared_types() {
        let doc = sample();
        assert_eq!(
            doc.entry("mocha").unwrap().dependency_type,
            DependencyType::Development
        );
        assert_eq!(
            doc.entry("jquery").unwrap().dependency_type,
            DependencyType::Production
        );
    }

    #[test]
    fn test_rejects_non_string_version() {
        let result = ManifestDocument::parse(r#"{"dependencies": {"jquery": 2}}"#);
        assert!(matches!(result, Err(ManifestError::Malformed { .. })));
    }

    #[test]
    fn test_rejects_non_object_dependencies() {
        let result = ManifestDocument::parse(r#"{"devDependencies": ["mocha"]}"#);
        assert!(matches!(result, Err(ManifestError::Malformed { .. })));
    }

    #[test]
    fn test_update_version_in_place() {
        let mut doc = sample();
        doc.update_entry("jquery", Some("~2.2.0"), None, &path())
            .unwrap();

        let names: Vec<_> = doc.declared().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["jquery", "angular", "mocha"]);
        assert_eq!(doc.entry("jquery").unwrap().range, "~2.2.0");
    }

    #[test]
    fn test_update_type_moves_entry() {
        let mut doc = sample();
        doc.update_entry("angular", None, Some(DependencyType::Development), &path())
            .unwrap();

        let snapshot = doc.snapshot();
        assert!(!snapshot.dependencies.contains_key("angular"));
        assert_eq!(
            snapshot.dev_dependencies.get("angular").map(String::as_str),
            Some("1.3.15")
        );
    }

    #[test]
    fn test_update_unknown_entry_fails() {
        let mut doc = sample();
        let result = doc.update_entry("react", Some("1.0.0"), None, &path());
        assert!(matches!(result, Err(ManifestError::EntryNotFound { .. })));
    }

    #[test]
    fn test_remove_entry() {
        let mut doc = sample();
        assert!(doc.remove_entry("mocha"));
        assert!(!doc.remove_entry("mocha"));
        assert!(doc.snapshot().dev_dependencies.is_empty());
    }

    #[test]
    fn test_metadata_survives_rewrite() {
        let mut doc = sample();
        doc.set_entry("lodash", "^3.10.0", DependencyType::Production);
        let content = doc.to_json_string().unwrap();

        let reparsed = ManifestDocument::parse(&content).unwrap();
        assert_eq!(reparsed.name(), Some("webapp"));
        assert_eq!(
            reparsed.as_object().get("main").and_then(Value::as_str),
            Some("index.js")
        );
        assert!(reparsed.as_object().contains_key("ignore"));

        let name_pos = content.find("\"name\"").unwrap();
        let deps_pos = content.find("\"dependencies\"").unwrap();
        let ignore_pos = content.find("\"ignore\"").unwrap();
        assert!(name_pos < deps_pos && deps_pos < ignore_pos);
    }

    #[test]
    fn test_snapshot_ignores_key_order() {
        let a = ManifestDocument::parse(r#"{"dependencies": {"a": "1.0.0", "b": "2.0.0"}}"#)
            .unwrap();
        let b = ManifestDocument::parse(r#"{"dependencies": {"b": "2.0.0", "a": "1.0.0"}}"#)
            .unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_from_packages_routes_by_type() {
        let packages = vec![
            Package::new("jquery")
                .with_declared("~2.1.0", DependencyType::Production)
                .with_version("2.1.4"),
            Package::new("mocha").with_declared("^2.0.0", DependencyType::Development),
            Package::new("lodash").with_version("3.10.1"),
        ];

        let snapshot = ManifestDocument::from_packages("webapp", &packages).snapshot();
        assert_eq!(snapshot.dependencies.len(), 2);
        assert_eq!(snapshot.dependencies["jquery"], "~2.1.0");
        assert_eq!(snapshot.dependencies["lodash"], "~3.10.1");
        assert_eq!(snapshot.dev_dependencies["mocha"], "^2.0.0");
    }
}
