//! Install TypeScript declaration packages and convert them to Kotlin.
//!
//! This crate provides:
//! - Reading dependency ranges from `package.json`
//! - Resolving which `@types` version to install
//! - Running the package manager and the `ts2kt` converter
//! - Configuration, including the optional `ts2kt.toml`

mod automator;
mod config;
mod converter;
mod manifest;
mod package;
mod process;
mod resolve;

pub use automator::{Automator, AutomatorError};
pub use config::{AutomatorConfig, ConfigError, ConfigFile, CONFIG_FILE, DEFAULT_PACKAGE_MANAGER};
pub use converter::{
    convert_args, local_converter, resolve_converter, ConvertPlan, ConverterLocation,
    CONVERTER_BIN,
};
pub use manifest::{
    package_dependencies, package_version, DependencyManifest, ManifestError, ManifestFile,
    ManifestSource,
};
pub use package::{
    declaration_path, types_dir, types_package, PackageSpec, SpecError, DECLARATION_FILE, LATEST,
    MANIFEST_FILE, MODULES_DIR, TYPES_SCOPE,
};
pub use process::{
    CommandRunner, ErrorDetection, OutputSink, ProcessError, ProcessRunner, SharedBuffer,
    StdinMode,
};
pub use resolve::{
    install_args, resolve_version, InstallPlan, ResolvedVersion, VersionSource, NO_SAVE_FLAG,
};
