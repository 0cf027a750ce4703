//! Project manifest (`package.json`) loading.
//!
//! Only the `dependencies` table is read. Every lookup goes back to the
//! source, so edits to the manifest between operations are always observed.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest not found at: {0}")]
    NotFound(PathBuf),

    #[error("failed to read manifest file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The subset of `package.json` this tool cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DependencyManifest {
    /// Runtime dependencies, name to version range.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl DependencyManifest {
    /// Build a manifest snapshot from `(name, range)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            dependencies: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or `dependencies` is not a
    /// string-to-string object.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a manifest from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file does not exist.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ManifestError::NotFound(path.to_path_buf())
            } else {
                ManifestError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Declared version range for `name`.
    #[must_use]
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.dependencies.get(name).map(String::as_str)
    }
}

/// Somewhere a dependency manifest can be loaded from.
pub trait ManifestSource: Send + Sync {
    /// Load a fresh snapshot of the manifest.
    fn load(&self) -> Result<DependencyManifest, ManifestError>;
}

/// A manifest stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional manifest location inside a project directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(crate::MANIFEST_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSource for ManifestFile {
    fn load(&self) -> Result<DependencyManifest, ManifestError> {
        DependencyManifest::from_path(&self.path)
    }
}

impl ManifestSource for DependencyManifest {
    fn load(&self) -> Result<DependencyManifest, ManifestError> {
        Ok(self.clone())
    }
}

/// All runtime dependencies declared by the manifest.
pub fn package_dependencies(
    source: &impl ManifestSource,
) -> Result<BTreeMap<String, String>, ManifestError> {
    Ok(source.load()?.dependencies)
}

/// Declared version range for a single package, if any.
pub fn package_version(
    source: &impl ManifestSource,
    name: &str,
) -> Result<Option<String>, ManifestError> {
    Ok(source.load()?.version_of(name).map(str::to_string))
}
