//! fsbackfill CLI
//!
//! One-shot copy of Firestore collections into PostgreSQL tables

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "fsbackfill")]
#[command(about = "Backfill Firestore collections into PostgreSQL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Copy the listed collections into their tables
    Run(commands::run::RunArgs),
    /// Show registered collection mappings
    Mappings(commands::mappings::MappingsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Mappings(args) => commands::mappings::execute(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
