//! Automator configuration.
//!
//! Everything an operation touches outside its arguments (the project
//! directory, the manifest, the tools it launches and the streams they use)
//! is carried explicitly in [`AutomatorConfig`]. Project-wide defaults can be
//! kept in an optional `ts2kt.toml` next to the manifest:
//!
//! ```toml
//! package-manager = "pnpm"
//! converter = "tools/ts2kt"
//! error-detection = "exit-code"
//! out-dir = "src/main/kotlin/externals"
//! ```

use crate::manifest::ManifestFile;
use crate::process::{ErrorDetection, OutputSink, ProcessRunner, StdinMode};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// The optional configuration filename.
pub const CONFIG_FILE: &str = "ts2kt.toml";

/// Package manager used when none is configured.
pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown error detection mode '{0}', expected one of: stderr-presence, exit-code")]
    UnknownErrorDetection(String),
}

/// Contents of `ts2kt.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigFile {
    /// Package manager executable.
    #[serde(default)]
    pub package_manager: Option<String>,

    /// Converter executable, relative paths are taken from the project root.
    #[serde(default)]
    pub converter: Option<PathBuf>,

    /// How finished processes are judged.
    #[serde(default)]
    pub error_detection: Option<ErrorDetection>,

    /// Default destination for generated Kotlin sources.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,

    /// Manifest path, relative to the project root.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl ConfigFile {
    /// Parse a config file from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file from a path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `ts2kt.toml` from `dir`, if there is one.
    pub fn find_in(dir: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = dir.as_ref().join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_path(path).map(Some)
    }
}

/// Settings shared by every operation of an [`crate::Automator`].
#[derive(Debug, Clone)]
pub struct AutomatorConfig {
    /// Project root. Children run here and declarations are looked up here.
    pub working_dir: PathBuf,

    /// Manifest location; `<working_dir>/package.json` when unset.
    pub manifest_path: Option<PathBuf>,

    /// Package manager executable.
    pub package_manager: String,

    /// Converter executable; discovered when unset.
    ///
    /// Relative paths with separators are anchored at the project root when
    /// the converter is launched.
    pub converter: Option<PathBuf>,

    /// How finished processes are judged.
    pub error_detection: ErrorDetection,

    /// Stdin handed to children.
    pub stdin: StdinMode,

    /// Where children's stdout goes.
    pub stdout: OutputSink,
}

impl Default for AutomatorConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            manifest_path: None,
            package_manager: String::from(DEFAULT_PACKAGE_MANAGER),
            converter: None,
            error_detection: ErrorDetection::default(),
            stdin: StdinMode::default(),
            stdout: OutputSink::default(),
        }
    }
}

impl AutomatorConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    /// Start from the values in a config file.
    ///
    /// The file is the base layer: `with_*` calls made afterwards override
    /// it, whatever value they set.
    pub fn from_file(working_dir: impl Into<PathBuf>, file: &ConfigFile) -> Self {
        let mut config = Self::new(working_dir);
        if let Some(program) = &file.package_manager {
            config.package_manager.clone_from(program);
        }
        if let Some(mode) = file.error_detection {
            config.error_detection = mode;
        }
        config.converter = file.converter.as_ref().map(|p| config.project_path(p));
        config.manifest_path = file.manifest.as_ref().map(|p| config.working_dir.join(p));
        config
    }

    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_package_manager(mut self, program: impl Into<String>) -> Self {
        self.package_manager = program.into();
        self
    }

    /// Relative paths with separators are taken from the project root.
    #[must_use]
    pub fn with_converter(mut self, program: impl Into<PathBuf>) -> Self {
        self.converter = Some(program.into());
        self
    }

    #[must_use]
    pub fn with_error_detection(mut self, mode: ErrorDetection) -> Self {
        self.error_detection = mode;
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: StdinMode) -> Self {
        self.stdin = stdin;
        self
    }

    #[must_use]
    pub fn with_stdout(mut self, stdout: OutputSink) -> Self {
        self.stdout = stdout;
        self
    }

    /// Where the manifest is read from.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.working_dir.join(crate::MANIFEST_FILE))
    }

    /// The on-disk manifest source for this configuration.
    pub fn manifest_source(&self) -> ManifestFile {
        ManifestFile::new(self.manifest_path())
    }

    /// The project root as an absolute path.
    ///
    /// A relative `working_dir` is taken from the current directory, so
    /// paths built from the root mean the same thing inside a child that
    /// runs there.
    pub fn project_root(&self) -> PathBuf {
        if self.working_dir.is_absolute() {
            return self.working_dir.clone();
        }
        let Ok(mut root) = std::env::current_dir() else {
            return self.working_dir.clone();
        };
        root.extend(
            self.working_dir
                .components()
                .filter(|c| !matches!(c, Component::CurDir)),
        );
        root
    }

    /// A process runner honouring this configuration.
    pub fn process_runner(&self) -> ProcessRunner {
        ProcessRunner::new()
            .with_working_dir(self.project_root())
            .with_stdin(self.stdin)
            .with_stdout(self.stdout.clone())
            .with_error_detection(self.error_detection)
    }

    /// Anchor a relative program path with separators at the project root.
    ///
    /// Bare names like `ts2kt` are left alone so the executable search path
    /// still applies to them.
    pub fn project_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.components().count() < 2 {
            path.to_path_buf()
        } else {
            self.project_root().join(path)
        }
    }
}
