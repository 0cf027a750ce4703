//! End-to-end tests for install and convert.
//!
//! Most tests use a recording runner; the `spawned` module launches real
//! processes.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use ts2kt_pkg::{
    Automator, AutomatorConfig, AutomatorError, CommandRunner, ConverterLocation,
    DependencyManifest, ManifestError, ManifestFile, ProcessError, VersionSource,
};

/// Records every invocation and optionally fails the n-th one.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    fail_on: Option<usize>,
}

impl RecordingRunner {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &str, args: &[String]) -> Result<(), ProcessError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((command.to_string(), args.to_vec()));

        if self.fail_on == Some(index) {
            return Err(ProcessError::Execution {
                command: command.to_string(),
                stderr: "npm ERR! 404 Not Found".to_string(),
                status: Some(1),
            });
        }
        Ok(())
    }
}

fn lodash_manifest() -> DependencyManifest {
    DependencyManifest::parse(r#"{"dependencies": {"lodash": "^4.17.0"}}"#).unwrap()
}

fn automator(manifest: DependencyManifest) -> Automator<RecordingRunner, DependencyManifest> {
    Automator::with_parts(AutomatorConfig::default(), RecordingRunner::default(), manifest)
}

#[tokio::test]
async fn install_uses_manifest_range() {
    let automator = automator(lodash_manifest());

    let plan = automator.install_types("lodash").await.unwrap();

    assert_eq!(plan.version.source, VersionSource::Manifest);
    assert_eq!(
        automator.runner().calls(),
        vec![(
            "npm".to_string(),
            vec![
                "install".to_string(),
                "@types/lodash@^4.17.0".to_string(),
                "--no-save".to_string()
            ]
        )]
    );
}

#[tokio::test]
async fn install_explicit_version_ignores_manifest() {
    let automator = automator(lodash_manifest());

    automator.install_types("lodash@3.0.0").await.unwrap();

    let calls = automator.runner().calls();
    assert_eq!(calls[0].1, vec!["install", "@types/lodash@3.0.0", "--no-save"]);
}

#[tokio::test]
async fn install_undeclared_package_requests_latest() {
    let automator = automator(lodash_manifest());

    automator.install_types("moment").await.unwrap();

    let calls = automator.runner().calls();
    assert_eq!(calls[0].1, vec!["install", "@types/moment@latest", "--no-save"]);
}

#[tokio::test]
async fn install_with_custom_package_manager() {
    let config = AutomatorConfig::default().with_package_manager("pnpm");
    let automator = Automator::with_parts(config, RecordingRunner::default(), lodash_manifest());

    automator.install_types("lodash").await.unwrap();

    assert_eq!(automator.config().package_manager, "pnpm");
    assert_eq!(automator.runner().calls()[0].0, "pnpm");
}

#[tokio::test]
async fn install_reads_manifest_from_disk() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("package.json"),
        r#"{"name": "app", "dependencies": {"express": "~4.18.2"}}"#,
    )
    .unwrap();
    let config = AutomatorConfig::new(tmp.path());
    let manifest = config.manifest_source();
    let automator = Automator::with_parts(config, RecordingRunner::default(), manifest);

    automator.install_types("express").await.unwrap();

    assert_eq!(
        automator.runner().calls()[0].1[1],
        "@types/express@~4.18.2".to_string()
    );
}

#[tokio::test]
async fn install_without_manifest_fails_before_launch() {
    let tmp = TempDir::new().unwrap();
    let config = AutomatorConfig::new(tmp.path());
    let automator = Automator::with_parts(
        config,
        RecordingRunner::default(),
        ManifestFile::in_dir(tmp.path()),
    );

    let err = automator.install_types("lodash").await.unwrap_err();

    assert!(matches!(
        err,
        AutomatorError::Manifest(ManifestError::NotFound(_))
    ));
    assert!(automator.runner().calls().is_empty());
}

#[tokio::test]
async fn install_failure_propagates_unchanged() {
    let automator = Automator::with_parts(
        AutomatorConfig::default(),
        RecordingRunner::failing_on(0),
        lodash_manifest(),
    );

    let err = automator.install_types("lodash").await.unwrap_err();

    match err {
        AutomatorError::Process(ProcessError::Execution { stderr, .. }) => {
            assert_eq!(stderr, "npm ERR! 404 Not Found");
        }
        other => panic!("expected process error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_identifier_is_rejected() {
    let automator = automator(lodash_manifest());

    let err = automator.install_types("@1.0.0").await.unwrap_err();

    assert!(matches!(err, AutomatorError::Spec(_)));
    assert!(automator.runner().calls().is_empty());
}

#[tokio::test]
async fn convert_builds_converter_arguments() {
    let config = AutomatorConfig::default().with_converter("/usr/local/bin/ts2kt");
    let automator = Automator::with_parts(config, RecordingRunner::default(), lodash_manifest());

    let plan = automator
        .convert_types_to_kotlin("moment", "./out")
        .await
        .unwrap();

    assert_eq!(plan.name, "moment");
    assert_eq!(
        automator.runner().calls(),
        vec![(
            "/usr/local/bin/ts2kt".to_string(),
            vec![
                "-d".to_string(),
                "./out".to_string(),
                "./node_modules/@types/moment/index.d.ts".to_string()
            ]
        )]
    );
}

#[tokio::test]
async fn convert_strips_version_suffix() {
    let automator = automator(lodash_manifest());

    let plan = automator
        .convert_types_to_kotlin("lodash@4.17.21", "build/kotlin")
        .await
        .unwrap();

    assert_eq!(plan.name, "lodash");
    assert_eq!(
        plan.args,
        vec!["-d", "build/kotlin", "./node_modules/@types/lodash/index.d.ts"]
    );
}

#[tokio::test]
async fn convert_prefers_local_converter() {
    let tmp = TempDir::new().unwrap();
    let local = ts2kt_pkg::local_converter(tmp.path());
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, "#!/bin/sh\n").unwrap();

    let config = AutomatorConfig::new(tmp.path());
    let automator = Automator::with_parts(config, RecordingRunner::default(), lodash_manifest());

    let plan = automator.convert_types_to_kotlin("moment", "out").await.unwrap();

    assert_eq!(plan.converter, ConverterLocation::Local(local.clone()));
    assert_eq!(automator.runner().calls()[0].0, local.to_string_lossy());
    assert_eq!(
        plan.declaration,
        tmp.path().join("node_modules/@types/moment/index.d.ts")
    );
}

#[tokio::test]
async fn generate_installs_then_converts() {
    let automator = automator(lodash_manifest());

    let (installed, converted) = automator.generate("lodash", "out").await.unwrap();

    assert_eq!(installed.target(), "@types/lodash@^4.17.0");
    assert_eq!(converted.destination, Path::new("out"));

    let calls = automator.runner().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "npm");
    assert_eq!(calls[1].0, "ts2kt");
}

#[tokio::test]
async fn generate_stops_after_failed_install() {
    let automator = Automator::with_parts(
        AutomatorConfig::default(),
        RecordingRunner::failing_on(0),
        lodash_manifest(),
    );

    assert!(automator.generate("lodash", "out").await.is_err());
    assert_eq!(automator.runner().calls().len(), 1);
}

#[tokio::test]
async fn lists_manifest_dependencies() {
    let automator = automator(lodash_manifest());

    let deps = automator.package_dependencies().unwrap();

    assert_eq!(deps.len(), 1);
    assert_eq!(deps["lodash"], "^4.17.0");
}

#[cfg(unix)]
mod spawned {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use ts2kt_pkg::{Automator, AutomatorConfig, StdinMode};

    /// Fails unless called as `-d <dir> <declaration>` with an existing
    /// declaration relative to its own working directory.
    const FAKE_CONVERTER: &str = r#"#!/bin/sh
[ "$1" = "-d" ] || { echo "unexpected flag $1" >&2; exit 1; }
test -f "$3" || { echo "missing $3 (cwd $(pwd))" >&2; exit 1; }
mkdir -p "$2" && touch "$2/moment.kt"
"#;

    /// A project directory created under the current directory, addressed
    /// by a relative path.
    fn relative_project() -> (TempDir, PathBuf) {
        let tmp = tempfile::Builder::new()
            .prefix("ts2kt-project")
            .tempdir_in(".")
            .unwrap();
        let relative = PathBuf::from(tmp.path().file_name().unwrap());

        let declaration = ts2kt_pkg::declaration_path(tmp.path(), "moment");
        std::fs::create_dir_all(declaration.parent().unwrap()).unwrap();
        std::fs::write(&declaration, "export declare function moment(): string;\n").unwrap();

        (tmp, relative)
    }

    fn install_script(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, FAKE_CONVERTER).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn relative_working_dir_with_configured_converter() {
        let (tmp, relative) = relative_project();
        install_script(&tmp.path().join("bin/fake-ts2kt"));

        let config = AutomatorConfig::new(&relative)
            .with_converter("bin/fake-ts2kt")
            .with_stdin(StdinMode::Null);
        let automator = Automator::new(config);

        let plan = automator
            .convert_types_to_kotlin("moment", "out")
            .await
            .unwrap();

        assert_eq!(plan.args[2], "./node_modules/@types/moment/index.d.ts");
        assert!(tmp.path().join("out/moment.kt").is_file());
    }

    #[tokio::test]
    async fn relative_working_dir_with_local_converter() {
        let (tmp, relative) = relative_project();
        install_script(&ts2kt_pkg::local_converter(tmp.path()));

        let config = AutomatorConfig::new(&relative).with_stdin(StdinMode::Null);
        let automator = Automator::new(config);

        automator
            .convert_types_to_kotlin("moment@2.29.4", "kotlin")
            .await
            .unwrap();

        assert!(tmp.path().join("kotlin/moment.kt").is_file());
    }
}
