//! Locating the converter and building its invocation.

use crate::{declaration_path, MODULES_DIR};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the converter executable.
pub const CONVERTER_BIN: &str = "ts2kt";

/// Where the converter executable was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterLocation {
    /// Set explicitly in configuration.
    Configured(PathBuf),
    /// Installed into the project's `node_modules/.bin`.
    Local(PathBuf),
    /// Left to the executable search path.
    SearchPath,
}

impl ConverterLocation {
    /// The program to launch.
    pub fn program(&self) -> String {
        match self {
            Self::Configured(path) | Self::Local(path) => path.to_string_lossy().into_owned(),
            Self::SearchPath => CONVERTER_BIN.to_string(),
        }
    }
}

impl fmt::Display for ConverterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured(path) => write!(f, "{} (configured)", path.display()),
            Self::Local(path) => write!(f, "{} (local)", path.display()),
            Self::SearchPath => write!(f, "{CONVERTER_BIN} (PATH)"),
        }
    }
}

/// Path the converter's launcher script has when installed locally.
#[must_use]
pub fn local_converter(root: &Path) -> PathBuf {
    let bin = if cfg!(windows) {
        format!("{CONVERTER_BIN}.cmd")
    } else {
        CONVERTER_BIN.to_string()
    };
    root.join(MODULES_DIR).join(".bin").join(bin)
}

/// Find the converter: configured path, then local install, then `PATH`.
pub fn resolve_converter(root: &Path, configured: Option<&Path>) -> ConverterLocation {
    if let Some(path) = configured {
        return ConverterLocation::Configured(path.to_path_buf());
    }

    let local = local_converter(root);
    if local.is_file() {
        return ConverterLocation::Local(local);
    }

    ConverterLocation::SearchPath
}

/// A fully resolved converter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertPlan {
    /// Package whose declarations are converted, without version.
    pub name: String,
    /// Directory the Kotlin sources are written to.
    pub destination: PathBuf,
    /// Declaration file on disk, under the project root.
    pub declaration: PathBuf,
    pub converter: ConverterLocation,
    /// Arguments passed to the converter, which runs in the project root.
    pub args: Vec<String>,
}

impl ConvertPlan {
    /// Plan the conversion of `name` installed under `root`.
    ///
    /// The converter runs inside `root`, so the declaration argument is
    /// always `./node_modules/@types/<name>/index.d.ts`.
    pub fn new(
        root: &Path,
        name: impl Into<String>,
        destination: impl Into<PathBuf>,
        converter: ConverterLocation,
    ) -> Self {
        let name = name.into();
        let destination = destination.into();
        let declaration = declaration_path(root, &name);
        let args = convert_args(&destination, &declaration_path(Path::new("."), &name));
        Self {
            name,
            destination,
            declaration,
            converter,
            args,
        }
    }

    pub fn program(&self) -> String {
        self.converter.program()
    }
}

/// Arguments for converting `declaration` into `destination`.
#[must_use]
pub fn convert_args(destination: &Path, declaration: &Path) -> Vec<String> {
    vec![
        "-d".to_string(),
        destination.to_string_lossy().into_owned(),
        declaration.to_string_lossy().into_owned(),
    ]
}
