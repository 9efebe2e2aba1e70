//! threatgraph CLI
//!
//! Command-line surface over the technique-matching pipeline.
//!
//! # Commands
//!
//! - `create`: build an embedding index from a technique catalog
//! - `match`: rank techniques against one or more query strings
//! - `enrich`: rewrite attack-tree documents with matched technique ids
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: error (bad input, missing file, provider failure)
//! - `2`: index corruption or provider mismatch (rebuild required)

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

/// threatgraph - map attack steps to catalog techniques
#[derive(Parser)]
#[command(name = "threatgraph")]
#[command(version)]
#[command(about = "Semantic technique matching and attack-tree enrichment")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an embedding index from a technique catalog
    Create(commands::create::CreateArgs),
    /// Match query strings against an index
    Match(commands::matching::MatchArgs),
    /// Enrich attack-tree documents with matched technique ids
    Enrich(commands::enrich::EnrichArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr so stdout stays parseable.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Create(args) => commands::create::create_command(args).await,
        Commands::Match(args) => commands::matching::match_command(args).await,
        Commands::Enrich(args) => commands::enrich::enrich_command(args).await,
    };

    std::process::exit(exit_code);
}
