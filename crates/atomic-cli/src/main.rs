mod audit_file;
mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use atomic_config::AtomicConfig;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::Commands;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "atomic")]
#[command(about = "Run multi-service transactions with compensating rollback", long_about = None)]
struct Cli {
    /// Explicit path to an Atomic.toml file
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Path to start config discovery from (default: current directory)
    #[arg(long = "path", short = 'C', global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match load_config(cli.config, cli.path) {
        Ok(config) => config,
        Err(e) => {
            print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = cli.command.execute(&config) {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .init();
}

fn load_config(config: Option<PathBuf>, path: Option<PathBuf>) -> Result<AtomicConfig, CliError> {
    if let Some(config) = config {
        return Ok(atomic_config::load_config(&config)?);
    }
    let start_path = match path {
        Some(p) => p,
        None => std::env::current_dir().map_err(CliError::CurrentDir)?,
    };
    Ok(atomic_config::discover_config(&start_path)?)
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
