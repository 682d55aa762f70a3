//! Polyvoice CLI - inspect presets and trace voice allocation.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyvoice")]
#[command(author, version, about = "Polyphonic voice manager CLI", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and inspect voice presets
    Presets(commands::presets::PresetsArgs),

    /// Run a note script against a preset and print the scheduled automation
    Trace(commands::trace::TraceArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Trace(args) => commands::trace::run(args),
    }
}
