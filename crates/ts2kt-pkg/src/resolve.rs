//! Version resolution for declaration installs.
//!
//! The version requested for `@types/<name>` is picked in order:
//! 1. the explicit `@version` suffix of the identifier,
//! 2. the range the manifest declares for `<name>`,
//! 3. [`LATEST`].
//!
//! Ranges are never interpreted here. They are passed through verbatim and
//! the package manager decides what they mean.

use crate::manifest::{ManifestError, ManifestSource};
use crate::{PackageSpec, LATEST};
use std::fmt;
use tracing::debug;

/// Flag telling the package manager not to record the install in the manifest.
pub const NO_SAVE_FLAG: &str = "--no-save";

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// Given by the caller as `name@version`.
    Explicit,
    /// Declared in the manifest's `dependencies`.
    Manifest,
    /// Neither was available.
    Latest,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Manifest => write!(f, "manifest"),
            Self::Latest => write!(f, "default"),
        }
    }
}

/// The version string to request, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub source: VersionSource,
}

/// Resolve the effective version for `spec`.
///
/// The manifest is only loaded when the identifier carries no version.
///
/// # Errors
///
/// Propagates manifest load failures.
pub fn resolve_version(
    spec: &PackageSpec,
    manifest: &impl ManifestSource,
) -> Result<ResolvedVersion, ManifestError> {
    if let Some(version) = &spec.version {
        return Ok(ResolvedVersion {
            version: version.clone(),
            source: VersionSource::Explicit,
        });
    }

    let manifest = manifest.load()?;
    let resolved = match manifest.version_of(&spec.name) {
        Some(range) if !range.is_empty() => ResolvedVersion {
            version: range.to_string(),
            source: VersionSource::Manifest,
        },
        _ => ResolvedVersion {
            version: LATEST.to_string(),
            source: VersionSource::Latest,
        },
    };

    debug!(
        package = %spec.name,
        version = %resolved.version,
        source = %resolved.source,
        "resolved declaration version"
    );

    Ok(resolved)
}

/// A fully resolved package-manager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// The identifier as the caller gave it.
    pub spec: PackageSpec,
    /// Version that will be requested.
    pub version: ResolvedVersion,
    /// Package manager executable.
    pub program: String,
    /// Arguments passed to the package manager.
    pub args: Vec<String>,
}

impl InstallPlan {
    pub fn new(program: impl Into<String>, spec: PackageSpec, version: ResolvedVersion) -> Self {
        let args = install_args(&spec.name, &version.version);
        Self {
            spec,
            version,
            program: program.into(),
            args,
        }
    }

    /// The versioned package being installed, e.g. `@types/lodash@^4.17.0`.
    pub fn target(&self) -> &str {
        &self.args[1]
    }
}

/// Arguments for installing `@types/<name>@<version>` without saving.
#[must_use]
pub fn install_args(name: &str, version: &str) -> Vec<String> {
    vec![
        "install".to_string(),
        format!("{}@{version}", crate::types_package(name)),
        NO_SAVE_FLAG.to_string(),
    ]
}
