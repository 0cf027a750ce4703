//! Implementation of the `ts2kt convert` and `ts2kt generate` commands.

use anyhow::{Context, Result};
use std::path::PathBuf;
use ts2kt_pkg::{Automator, CommandRunner, ManifestSource};

/// Options for converting installed declarations.
#[derive(Debug)]
pub struct ConvertOptions {
    /// Package identifier; a version suffix is ignored.
    pub package: String,
    /// Directory the Kotlin sources are written to.
    pub destination: PathBuf,
    /// Install the declarations first.
    pub install: bool,
}

/// Convert declarations for one package, installing them first if asked.
pub async fn convert_types<R, M>(automator: &Automator<R, M>, options: ConvertOptions) -> Result<()>
where
    R: CommandRunner,
    M: ManifestSource,
{
    let ConvertOptions {
        package,
        destination,
        install,
    } = options;

    if install {
        automator
            .install_types(&package)
            .await
            .with_context(|| format!("Failed to install type declarations for `{package}`"))?;
    }

    automator
        .convert_types_to_kotlin(&package, &destination)
        .await
        .with_context(|| {
            format!(
                "Failed to convert `{package}` into {}",
                destination.display()
            )
        })?;

    Ok(())
}
