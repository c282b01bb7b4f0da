//! # rootchain CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// PBFT rootchain tooling.
///
/// Validates deployment manifests, manages operator keys and produces
/// operator signatures over checkpoint and exit entries.
#[derive(Parser, Debug)]
#[command(name = "rootchain", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a deployment manifest and print the operator set.
    Bootstrap(rootchain_cli::bootstrap::BootstrapArgs),
    /// Generate an operator key.
    Keygen(rootchain_cli::keygen::KeygenArgs),
    /// Print the signing digest of an entry.
    Digest(rootchain_cli::signing::DigestArgs),
    /// Sign an entry with an operator key.
    Sign(rootchain_cli::signing::SignArgs),
}

fn print(report: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Bootstrap(args) => print(&rootchain_cli::bootstrap::run(&args)?),
        Commands::Keygen(args) => print(&rootchain_cli::keygen::run(&args)?),
        Commands::Digest(args) => print(&rootchain_cli::signing::run_digest(&args)?),
        Commands::Sign(args) => print(&rootchain_cli::signing::run_sign(&args)?),
    }
}
