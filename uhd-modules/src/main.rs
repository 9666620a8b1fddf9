//! uhd-modload - UHD module loader
//!
//! Process bootstrap: loads the modules listed in `UHD_MODULE_PATH`
//! before anything else runs.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uhd_modules_core::LoaderConfig;
use uhd_modules_loader::{load_all_modules, load_modules, ModuleLoader, NativeOpener, StderrSink};

#[derive(Parser)]
#[command(name = "uhd-modload")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Loader configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Load every module on the module path, then any configured extra paths
    Load,

    /// Print the files a load pass would attempt, without loading them
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Load);

    // Modules load before anything else runs.
    if let Commands::Load = command {
        load_all_modules();
    }

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading loader config from {}", path.display());
            LoaderConfig::load(path)?
        }
        None => LoaderConfig::default(),
    };

    match command {
        Commands::Load => {
            if !config.module_paths.is_empty() {
                let report = load_modules(config.module_paths);
                tracing::info!(
                    "Loaded {} of {} configured modules",
                    report.loaded.len(),
                    report.attempted
                );
            }
        }

        Commands::List => {
            let mut loader = ModuleLoader::new(NativeOpener::default(), StderrSink);
            let (files, _) = loader.scan(config.paths_from_env());
            let mut stdout = std::io::stdout().lock();
            for file in files {
                stdout.write_all(file.as_os_str().as_encoded_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
