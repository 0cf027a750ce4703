//! The install and convert operations.

use crate::config::AutomatorConfig;
use crate::converter::{resolve_converter, ConvertPlan};
use crate::manifest::{package_dependencies, ManifestError, ManifestFile, ManifestSource};
use crate::process::{CommandRunner, ProcessError, ProcessRunner};
use crate::resolve::{resolve_version, InstallPlan};
use crate::{types_dir, PackageSpec, SpecError};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from an automator operation.
#[derive(Error, Debug)]
pub enum AutomatorError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Installs declaration packages and converts them to Kotlin.
///
/// The runner and manifest source are type parameters so tests can swap in
/// fakes; [`Automator::new`] wires the real ones from the configuration.
pub struct Automator<R = ProcessRunner, M = ManifestFile> {
    config: AutomatorConfig,
    runner: R,
    manifest: M,
}

impl Automator {
    pub fn new(config: AutomatorConfig) -> Self {
        let runner = config.process_runner();
        let manifest = config.manifest_source();
        Self {
            config,
            runner,
            manifest,
        }
    }
}

impl<R, M> Automator<R, M>
where
    R: CommandRunner,
    M: ManifestSource,
{
    pub fn with_parts(config: AutomatorConfig, runner: R, manifest: M) -> Self {
        Self {
            config,
            runner,
            manifest,
        }
    }

    pub fn config(&self) -> &AutomatorConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Dependencies declared by the project manifest.
    pub fn package_dependencies(&self) -> Result<BTreeMap<String, String>, AutomatorError> {
        Ok(package_dependencies(&self.manifest)?)
    }

    /// Resolve the install of `package` without running anything.
    pub fn plan_install(&self, package: &str) -> Result<InstallPlan, AutomatorError> {
        let spec = PackageSpec::parse(package)?;
        let version = resolve_version(&spec, &self.manifest)?;
        Ok(InstallPlan::new(&self.config.package_manager, spec, version))
    }

    /// Install `@types/<name>` at the resolved version without saving it.
    pub async fn install_types(&self, package: &str) -> Result<InstallPlan, AutomatorError> {
        let plan = self.plan_install(package)?;

        self.runner.run(&plan.program, &plan.args).await?;

        info!(
            "Package {} has been installed to {}.",
            package,
            types_dir(Path::new(""), &plan.spec.name).display()
        );

        Ok(plan)
    }

    /// Resolve the conversion of `package` into `destination`.
    pub fn plan_convert(
        &self,
        package: &str,
        destination: impl AsRef<Path>,
    ) -> Result<ConvertPlan, AutomatorError> {
        let spec = PackageSpec::parse(package)?;
        let configured = self
            .config
            .converter
            .as_deref()
            .map(|p| self.config.project_path(p));
        let converter = resolve_converter(&self.config.project_root(), configured.as_deref());
        debug!(converter = %converter, "resolved converter");

        Ok(ConvertPlan::new(
            &self.config.working_dir,
            spec.name,
            destination.as_ref(),
            converter,
        ))
    }

    /// Convert the installed declarations of `package` into `destination`.
    ///
    /// Any `@version` suffix is ignored: conversion works on whatever is
    /// installed.
    pub async fn convert_types_to_kotlin(
        &self,
        package: &str,
        destination: impl AsRef<Path>,
    ) -> Result<ConvertPlan, AutomatorError> {
        let plan = self.plan_convert(package, destination)?;

        self.runner.run(&plan.program(), &plan.args).await?;

        info!(
            "Types for {} have been converted and put into {}.",
            plan.name,
            plan.destination.display()
        );

        Ok(plan)
    }

    /// Install then convert, stopping at the first failure.
    pub async fn generate(
        &self,
        package: &str,
        destination: impl AsRef<Path>,
    ) -> Result<(InstallPlan, ConvertPlan), AutomatorError> {
        let installed = self.install_types(package).await?;
        let converted = self.convert_types_to_kotlin(package, destination).await?;
        Ok((installed, converted))
    }
}
