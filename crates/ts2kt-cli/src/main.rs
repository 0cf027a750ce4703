//! ts2kt CLI - install TypeScript declarations and convert them to Kotlin

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ts2kt_pkg::{Automator, ErrorDetection};

mod convert;
mod deps;
mod install;
mod settings;

#[derive(Parser)]
#[command(name = "ts2kt")]
#[command(version)]
#[command(about = "Install @types declarations and convert them to Kotlin", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    cwd: PathBuf,

    /// Path to package.json, relative to the project directory
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Package manager used to install declarations
    #[arg(long, global = true)]
    package_manager: Option<String>,

    /// Converter executable (defaults to node_modules/.bin/ts2kt, then PATH)
    #[arg(long, global = true)]
    converter: Option<PathBuf>,

    /// How to decide whether a tool failed: stderr-presence or exit-code
    #[arg(long, global = true)]
    error_detection: Option<ErrorDetection>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install @types declarations (e.g., "lodash" or "lodash@4.17.0")
    Install {
        /// Packages to install declarations for
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Convert installed declarations into Kotlin sources
    Convert {
        /// Package whose declarations to convert
        package: String,

        /// Destination directory for the Kotlin sources
        #[arg(short = 'd', long = "out-dir")]
        out_dir: Option<PathBuf>,
    },

    /// Install declarations, then convert them into Kotlin sources
    Generate {
        /// Package to install and convert
        package: String,

        /// Destination directory for the Kotlin sources
        #[arg(short = 'd', long = "out-dir")]
        out_dir: Option<PathBuf>,
    },

    /// List the dependencies declared in package.json
    Deps,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let settings = settings::load(&settings::GlobalOptions {
        cwd: cli.global.cwd,
        manifest: cli.global.manifest,
        package_manager: cli.global.package_manager,
        converter: cli.global.converter,
        error_detection: cli.global.error_detection,
    })?;

    tracing::debug!(
        working_dir = %settings.config.working_dir.display(),
        manifest = %settings.config.manifest_path().display(),
        package_manager = %settings.config.package_manager,
        error_detection = %settings.config.error_detection,
        "loaded settings"
    );

    match cli.command {
        Commands::Install { packages } => {
            let automator = Automator::new(settings.config);
            install::install_types(&automator, install::InstallOptions { packages }).await?;
        }

        Commands::Convert { package, out_dir } => {
            let destination = settings.destination(out_dir)?;
            let automator = Automator::new(settings.config);
            let options = convert::ConvertOptions {
                package,
                destination,
                install: false,
            };
            convert::convert_types(&automator, options).await?;
        }

        Commands::Generate { package, out_dir } => {
            let destination = settings.destination(out_dir)?;
            let automator = Automator::new(settings.config);
            let options = convert::ConvertOptions {
                package,
                destination,
                install: true,
            };
            convert::convert_types(&automator, options).await?;
        }

        Commands::Deps => {
            let automator = Automator::new(settings.config);
            deps::list_dependencies(&automator)?;
        }
    }

    Ok(())
}

/// Log to stderr so tool output on stdout stays clean.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
