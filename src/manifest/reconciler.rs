//! Manifest reconciliation
//!
//! Applies create / remove / entry mutations to bower.json and detects edits
//! made outside the crate by diffing dependency snapshots.
//!
//! Presence follows a two-state machine: `Absent -> Present` via `create` (or a
//! file appearing externally), `Present -> Absent` via `remove` or an external
//! deletion, `Present -> Present` for every content change.
//!
//! A file that fails to parse is tracked separately from presence: while it is
//! corrupt the reconciler refuses every write, so the user's content is never
//! replaced by a stale or generated document.

use super::{
    read_file, remove_file, with_path, write_file, DependencySnapshot, ManifestDocument,
    StructuredFile,
};
use crate::domain::{DependencyType, Package};
use crate::error::ManifestError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether the manifest file is known to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestState {
    #[default]
    Absent,
    Present,
}

/// Requested change to one manifest entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageEntryUpdate {
    /// New declared range
    pub version: Option<String>,
    /// New dependency map
    pub dependency_type: Option<DependencyType>,
}

impl PackageEntryUpdate {
    /// Change only the declared range
    pub fn version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            dependency_type: None,
        }
    }

    /// Change only the dependency type
    pub fn dependency_type(dependency_type: DependencyType) -> Self {
        Self {
            version: None,
            dependency_type: Some(dependency_type),
        }
    }
}

/// Written manifest content, returned by `create`
#[derive(Debug, Clone)]
pub struct ManifestHandle {
    /// Location of the written file
    pub path: PathBuf,
    /// Content as written
    pub document: ManifestDocument,
}

/// Sole writer of bower.json for one project
#[derive(Debug)]
pub struct ManifestReconciler {
    path: PathBuf,
    project_name: String,
    state: ManifestState,
    document: Option<ManifestDocument>,
    snapshot: Option<DependencySnapshot>,
    /// Parse error of the file on disk, if it is corrupt
    malformed: Option<String>,
}

impl ManifestReconciler {
    /// Creates a reconciler for the manifest in `project_dir`; nothing is read yet
    pub fn new(project_dir: &Path) -> Self {
        let project_name = project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string();
        Self {
            path: ManifestDocument::path_in(project_dir),
            project_name,
            state: ManifestState::Absent,
            document: None,
            snapshot: None,
            malformed: None,
        }
    }

    /// Path of the managed manifest
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current presence state
    pub fn state(&self) -> ManifestState {
        self.state
    }

    /// Last known manifest content
    pub fn document(&self) -> Option<&ManifestDocument> {
        self.document.as_ref()
    }

    /// Last known dependency snapshot
    pub fn snapshot(&self) -> Option<&DependencySnapshot> {
        self.snapshot.as_ref()
    }

    /// Returns true while the file on disk is known to be corrupt
    pub fn is_malformed(&self) -> bool {
        self.malformed.is_some()
    }

    /// Fails with `Malformed` while the file on disk is corrupt
    pub fn ensure_readable(&self) -> Result<(), ManifestError> {
        match self.malformed {
            Some(ref message) => Err(ManifestError::malformed(&self.path, message.clone())),
            None => Ok(()),
        }
    }

    /// Reads the manifest from disk at project open.
    ///
    /// A corrupt file is reported and marks the reconciler malformed; presence
    /// and cached content are left untouched.
    pub fn load(&mut self) -> Result<ManifestState, ManifestError> {
        match read_file(&self.path)? {
            Some(content) => {
                let document = self.parse(&content)?;
                self.accept(document);
            }
            None => self.clear(),
        }
        Ok(self.state)
    }

    /// Writes a manifest declaring the current package set
    pub fn create(&mut self, packages: &[Package]) -> Result<ManifestHandle, ManifestError> {
        self.ensure_readable()?;
        if self.state == ManifestState::Present {
            return Err(ManifestError::AlreadyExists {
                path: self.path.clone(),
            });
        }

        let document = ManifestDocument::from_packages(&self.project_name, packages);
        self.write(&document)?;
        self.accept(document.clone());
        info!(path = %self.path.display(), "created manifest");

        Ok(ManifestHandle {
            path: self.path.clone(),
            document,
        })
    }

    /// Deletes the manifest and forgets cached content
    pub fn remove(&mut self) -> Result<(), ManifestError> {
        if self.state == ManifestState::Absent && !self.is_malformed() {
            return Err(ManifestError::absent(&self.path));
        }
        remove_file(&self.path)?;
        self.clear();
        info!(path = %self.path.display(), "removed manifest");
        Ok(())
    }

    /// Rewrites one existing entry's version and/or dependency type
    pub fn update_package_entry(
        &mut self,
        name: &str,
        update: &PackageEntryUpdate,
    ) -> Result<(), ManifestError> {
        let mut document = self.present_document()?;
        document.update_entry(
            name,
            update.version.as_deref(),
            update.dependency_type,
            &self.path,
        )?;
        self.commit(document)
    }

    /// Declares a package, moving it if it is already declared in the other map
    pub fn add_package_entry(
        &mut self,
        name: &str,
        range: &str,
        dependency_type: DependencyType,
    ) -> Result<(), ManifestError> {
        let mut document = self.present_document()?;
        document.set_entry(name, range, dependency_type);
        self.commit(document)
    }

    /// Removes a package from the manifest; returns whether it was declared
    pub fn remove_package_entry(&mut self, name: &str) -> Result<bool, ManifestError> {
        let mut document = self.present_document()?;
        if !document.remove_entry(name) {
            return Ok(false);
        }
        self.commit(document)?;
        Ok(true)
    }

    /// Compares freshly read content against the cached snapshot.
    ///
    /// Returns true and adopts the new content when the dependency maps differ.
    /// Malformed content leaves the cache untouched.
    pub fn detect_external_change(&mut self, raw_content: &str) -> Result<bool, ManifestError> {
        let was_malformed = self.is_malformed();
        let document = match self.parse(raw_content) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "ignoring malformed manifest edit");
                return Err(e);
            }
        };

        let snapshot = document.snapshot();
        let changed = self.snapshot.as_ref() != Some(&snapshot);
        if changed || was_malformed {
            debug!(path = %self.path.display(), "manifest changed externally");
            self.accept(document);
        } else {
            // metadata-only edits still replace the cached document
            self.document = Some(document);
        }
        Ok(changed)
    }

    /// Handles the file disappearing; returns true on a `Present -> Absent` transition
    pub fn external_removal(&mut self) -> bool {
        let was_present = self.state == ManifestState::Present;
        if was_present || self.is_malformed() {
            debug!(path = %self.path.display(), "manifest deleted externally");
            self.clear();
        }
        was_present
    }

    fn present_document(&self) -> Result<ManifestDocument, ManifestError> {
        self.ensure_readable()?;
        match (&self.state, &self.document) {
            (ManifestState::Present, Some(document)) => Ok(document.clone()),
            _ => Err(ManifestError::absent(&self.path)),
        }
    }

    fn parse(&mut self, content: &str) -> Result<ManifestDocument, ManifestError> {
        match ManifestDocument::parse(content) {
            Ok(document) => Ok(document),
            Err(e) => {
                let e = with_path(e, &self.path);
                if let ManifestError::Malformed { ref message, .. } = e {
                    self.malformed = Some(message.clone());
                }
                Err(e)
            }
        }
    }

    fn commit(&mut self, document: ManifestDocument) -> Result<(), ManifestError> {
        self.ensure_readable()?;
        self.write(&document)?;
        self.accept(document);
        Ok(())
    }

    fn write(&self, document: &ManifestDocument) -> Result<(), ManifestError> {
        let content = document.to_json_string()?;
        write_file(&self.path, &content)
    }

    fn accept(&mut self, document: ManifestDocument) {
        self.snapshot = Some(document.snapshot());
        self.document = Some(document);
        self.state = ManifestState::Present;
        self.malformed = None;
    }

    fn clear(&mut self) {
        self.document = None;
        self.snapshot = None;
        self.state = ManifestState::Absent;
        self.malformed = None;
    }
}
