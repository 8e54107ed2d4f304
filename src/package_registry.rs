//! In-memory catalog of the project's packages
//!
//! This module provides:
//! - Merging of declared (manifest), installed (listing) and cached packages
//! - Stable iteration order: `dependencies`, `devDependencies`, then
//!   installed-only packages in the order the tool reported them
//!
//! Every reload replaces the set wholesale.

use crate::domain::Package;
use crate::manifest::ManifestDocument;
use crate::package_manager::{CacheEntry, ListedPackage};
use std::collections::HashMap;
use tracing::debug;

/// Packages of one project, keyed by name
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: Vec<Package>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the package set from the three sources
    ///
    /// `manifest` is `None` when the project has no manifest. Cache entries
    /// only enrich packages known from the other two sources.
    pub fn reload(
        &mut self,
        manifest: Option<&ManifestDocument>,
        installed: &[ListedPackage],
        cache: &[CacheEntry],
    ) {
        let mut packages: Vec<Package> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        if let Some(manifest) = manifest {
            for declared in manifest.declared() {
                if index.contains_key(&declared.name) {
                    continue;
                }
                index.insert(declared.name.clone(), packages.len());
                packages.push(
                    Package::new(declared.name).with_declared(declared.range, declared.dependency_type),
                );
            }
        }

        for listed in installed {
            match index.get(&listed.name) {
                Some(&i) => {
                    let package = &mut packages[i];
                    package.version = listed.version.clone();
                    package.latest_version = listed.latest_version.clone();
                }
                None => {
                    // Listed but neither installed nor declared: nothing to track
                    let Some(ref version) = listed.version else {
                        continue;
                    };
                    let mut package = Package::new(&listed.name).with_version(version);
                    package.latest_version = listed.latest_version.clone();
                    index.insert(listed.name.clone(), packages.len());
                    packages.push(package);
                }
            }
        }

        for entry in cache {
            if let (Some(&i), Some(version)) = (index.get(&entry.name), &entry.version) {
                let cached = &mut packages[i].cached_versions;
                if !cached.contains(version) {
                    cached.push(version.clone());
                }
            }
        }

        debug!(packages = packages.len(), "package registry reloaded");
        self.packages = packages;
    }

    /// All packages in stable order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a package by name
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
