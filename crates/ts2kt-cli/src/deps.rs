//! Implementation of the `ts2kt deps` command.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use ts2kt_pkg::{Automator, CommandRunner, ManifestSource};

/// Print the manifest's dependencies and the declaration package each maps to.
pub fn list_dependencies<R, M>(automator: &Automator<R, M>) -> Result<()>
where
    R: CommandRunner,
    M: ManifestSource,
{
    let deps = automator
        .package_dependencies()
        .context("Failed to read manifest")?;

    print!("{}", render(&deps));
    Ok(())
}

fn render(deps: &BTreeMap<String, String>) -> String {
    if deps.is_empty() {
        return String::from("No dependencies declared\n");
    }

    let width = deps.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (name, range) in deps {
        out.push_str(&format!(
            "{name:<width$}  {range:<12}  {}@{range}\n",
            ts2kt_pkg::types_package(name)
        ));
    }
    out
}
