//! Structured project files and manifest reconciliation
//!
//! This module provides:
//! - A single `StructuredFile` trait for JSON documents living in the project root
//! - `ManifestDocument` (bower.json) and `RcDocument` (.bowerrc)
//! - `ManifestReconciler`, the only component allowed to write bower.json

mod document;
mod rc_file;
mod reconciler;

pub use document::{DeclaredDependency, DependencySnapshot, ManifestDocument};
pub use rc_file::RcDocument;
pub use reconciler::{ManifestHandle, ManifestReconciler, ManifestState, PackageEntryUpdate};

use crate::error::ManifestError;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A JSON document stored under a fixed file name in the project root
pub trait StructuredFile: Sized {
    /// File name relative to the project root
    const FILE_NAME: &'static str;

    /// Builds the document from a parsed top-level object, validating known fields
    fn from_object(object: Map<String, Value>) -> Result<Self, String>;

    /// The full top-level object, including fields passed through opaquely
    fn as_object(&self) -> &Map<String, Value>;

    /// Parses document content
    fn parse(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::malformed(Self::FILE_NAME, e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(ManifestError::malformed(
                Self::FILE_NAME,
                "expected a JSON object at the top level",
            ));
        };
        Self::from_object(object).map_err(|message| ManifestError::malformed(Self::FILE_NAME, message))
    }

    /// Serializes the whole document with two-space indentation
    fn to_json_string(&self) -> Result<String, ManifestError> {
        let mut content = serde_json::to_string_pretty(self.as_object())
            .map_err(|e| ManifestError::malformed(Self::FILE_NAME, e.to_string()))?;
        content.push('\n');
        Ok(content)
    }

    /// Path of this document inside `project_dir`
    fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(Self::FILE_NAME)
    }

    /// Loads the document from `project_dir`, `None` if the file does not exist
    fn load(project_dir: &Path) -> Result<Option<Self>, ManifestError> {
        let path = Self::path_in(project_dir);
        match read_file(&path)? {
            Some(content) => Self::parse(&content)
                .map(Some)
                .map_err(|e| with_path(e, &path)),
            None => Ok(None),
        }
    }
}

/// Replaces the placeholder path of a parse error with the real file path
fn with_path(error: ManifestError, path: &Path) -> ManifestError {
    match error {
        ManifestError::Malformed { message, .. } => ManifestError::malformed(path, message),
        other => other,
    }
}

/// Read a file, `None` if it does not exist
pub fn read_file(path: &Path) -> Result<Option<String>, ManifestError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ManifestError::read_error(path, e)),
    }
}

/// Write content to a file, replacing it entirely
pub fn write_file(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

/// Delete a file; a file that is already gone is not an error
pub fn remove_file(path: &Path) -> Result<(), ManifestError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ManifestError::write_error(path, e)),
    }
}
