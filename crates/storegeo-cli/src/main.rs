mod resolve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storegeo")]
#[command(about = "Resolve retail store records to map coordinates")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve every store in a JSON array file and print one JSON line each.
    Resolve {
        /// Path to a JSON array of store records.
        #[arg(long, short)]
        input: PathBuf,
        /// Validate the input and print what would be resolved.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parsed before any env var is read.
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Resolve { input, dry_run }) => {
            let config = storegeo_core::load_app_config()?;
            init_tracing(&config.log_level)?;
            resolve::run_resolve(&config, &input, dry_run).await?;
        }
        None => println!("storegeo: no command given, try `storegeo resolve --help`"),
    }

    Ok(())
}
