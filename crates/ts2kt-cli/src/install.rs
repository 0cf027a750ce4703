//! Implementation of the `ts2kt install` command.

use anyhow::{Context, Result};
use ts2kt_pkg::{Automator, CommandRunner, ManifestSource};

/// Options for installing declaration packages.
#[derive(Debug)]
pub struct InstallOptions {
    /// Package identifiers, each `name` or `name@version`.
    pub packages: Vec<String>,
}

/// Install `@types` packages one after another, stopping at the first failure.
pub async fn install_types<R, M>(automator: &Automator<R, M>, options: InstallOptions) -> Result<()>
where
    R: CommandRunner,
    M: ManifestSource,
{
    for package in &options.packages {
        automator
            .install_types(package)
            .await
            .with_context(|| format!("Failed to install type declarations for `{package}`"))?;
    }

    Ok(())
}
