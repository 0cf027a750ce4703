//! Turning command-line options and `ts2kt.toml` into an automator config.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use ts2kt_pkg::{AutomatorConfig, ConfigFile, ErrorDetection};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Project directory.
    pub cwd: PathBuf,
    /// Manifest path override.
    pub manifest: Option<PathBuf>,
    /// Package manager override.
    pub package_manager: Option<String>,
    /// Converter override.
    pub converter: Option<PathBuf>,
    /// Error detection override.
    pub error_detection: Option<ErrorDetection>,
}

/// Resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub config: AutomatorConfig,
    /// Default destination from `ts2kt.toml`.
    pub out_dir: Option<PathBuf>,
}

impl Settings {
    /// Destination for generated sources: the flag, else the config file.
    pub fn destination(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.out_dir.clone()).ok_or_else(|| {
            anyhow::anyhow!(
                "No destination directory given. Pass --out-dir or set `out-dir` in {}.",
                ts2kt_pkg::CONFIG_FILE
            )
        })
    }
}

/// Build settings. Flags win over `ts2kt.toml`, which wins over defaults.
pub fn load(options: &GlobalOptions) -> Result<Settings> {
    let cwd = absolute(&options.cwd)?;

    let file = ConfigFile::find_in(&cwd)
        .with_context(|| format!("Failed to load {}", cwd.join(ts2kt_pkg::CONFIG_FILE).display()))?
        .unwrap_or_default();

    let mut config = AutomatorConfig::from_file(&cwd, &file);

    if let Some(manifest) = &options.manifest {
        config = config.with_manifest_path(cwd.join(manifest));
    }
    if let Some(program) = &options.package_manager {
        config = config.with_package_manager(program.clone());
    }
    if let Some(converter) = &options.converter {
        let program = config.project_path(converter);
        config = config.with_converter(program);
    }
    if let Some(mode) = options.error_detection {
        config = config.with_error_detection(mode);
    }

    Ok(Settings {
        config,
        out_dir: file.out_dir,
    })
}

/// Make `path` absolute against the current directory, dropping `.` parts.
fn absolute(path: &Path) -> Result<PathBuf> {
    let mut resolved = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().context("Failed to determine current directory")?
    };

    for component in path.components() {
        if !matches!(component, Component::CurDir) {
            resolved.push(component);
        }
    }

    Ok(resolved)
}
