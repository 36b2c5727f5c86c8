//! Quay CLI — resolve dependencies and generate build descriptors.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quay", version, about = "The quay C++ package manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new quay project
    Init {
        /// Project name
        name: String,
    },
    /// Resolve dependencies and generate build descriptors
    Sync {
        /// Project directory (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Build shared libraries by default
        #[arg(long)]
        shared: bool,
    },
    /// Collect project sources into a distributable archive
    Pack {
        /// Project directory (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Output archive path (default: <name>.tar.gz)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Init { name } => commands::init::run(&name),
        Commands::Sync { dir, shared } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            commands::sync::run(&dir, shared)
        }
        Commands::Pack { dir, output } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            commands::pack::run(&dir, output.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
