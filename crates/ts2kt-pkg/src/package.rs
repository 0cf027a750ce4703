//! Package identifiers and the on-disk layout of installed declarations.
//!
//! Declarations are installed into the conventional npm layout:
//! ```text
//! project/
//! ├── package.json              # Project manifest
//! └── node_modules/
//!     ├── .bin/ts2kt            # Locally installed converter (optional)
//!     └── @types/
//!         └── lodash/
//!             └── index.d.ts    # Declaration entry point
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The manifest filename.
pub const MANIFEST_FILE: &str = "package.json";

/// Directory holding installed packages.
pub const MODULES_DIR: &str = "node_modules";

/// Scope under which declaration packages are published.
pub const TYPES_SCOPE: &str = "@types";

/// Declaration entry point inside a declaration package.
pub const DECLARATION_FILE: &str = "index.d.ts";

/// Version requested when neither the caller nor the manifest names one.
pub const LATEST: &str = "latest";

/// Errors produced while parsing a package identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid package identifier '{0}': name cannot be empty")]
    EmptyName(String),
}

/// A package identifier of the form `name` or `name@version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package name, never empty.
    pub name: String,

    /// Explicitly requested version, if any.
    pub version: Option<String>,
}

impl PackageSpec {
    /// Parse an identifier, splitting on the first `@`.
    ///
    /// An empty suffix (`"lodash@"`) counts as no version.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::EmptyName`] when nothing precedes the `@`.
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let (name, version) = match raw.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (raw, None),
        };

        if name.is_empty() {
            return Err(SpecError::EmptyName(raw.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        })
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

impl std::str::FromStr for PackageSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Name of the declaration package for `name`, e.g. `@types/lodash`.
#[must_use]
pub fn types_package(name: &str) -> String {
    format!("{TYPES_SCOPE}/{name}")
}

/// Directory an installed declaration package lives in, relative to `root`.
#[must_use]
pub fn types_dir(root: &Path, name: &str) -> PathBuf {
    root.join(MODULES_DIR).join(TYPES_SCOPE).join(name)
}

/// Path of the declaration entry point for `name`, relative to `root`.
#[must_use]
pub fn declaration_path(root: &Path, name: &str) -> PathBuf {
    types_dir(root, name).join(DECLARATION_FILE)
}
