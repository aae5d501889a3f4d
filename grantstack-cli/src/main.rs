//! GrantStack inspector
//!
//! Reads data debit payloads as a client would receive them and prints what
//! the consent model makes of them.
//!
//! Usage:
//!   grantstack inspect debit.json --at 2026-05-01T00:00:00Z
//!   grantstack cache plug.json --shape plug

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grantstack_cli::{Shape, cache_entry, inspect_all};
use grantstack_model::CodecConfig;
use grantstack_types::Timestamp;
use std::{fs, path::PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "grantstack")]
#[command(about = "Inspect GrantStack data debits and cache entries")]
struct Args {
    /// Path to a codec config file (defaults to ~/.grantstack/grantstack.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a data debit payload at an instant
    Inspect {
        /// JSON file holding a data debit or an array of them
        file: PathBuf,

        /// Evaluation instant (ISO-8601, defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Print the cache entry a wire payload would produce
    Cache {
        /// JSON file holding one record
        file: PathBuf,

        /// Record shape of the payload
        #[arg(short, long, value_enum)]
        shape: Shape,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => CodecConfig::load_from(path),
        None => CodecConfig::load(),
    };

    let output = match args.command {
        Command::Inspect { file, at } => {
            let at = match at {
                Some(text) => Timestamp::parse(&text).context("Invalid --at timestamp")?,
                None => Timestamp::now(),
            };
            info!("Inspecting {:?} at {}", file, at);
            let raw = read(&file)?;
            serde_json::to_value(inspect_all(&raw, at, &config)?)?
        }
        Command::Cache { file, shape } => {
            info!("Encoding {:?} as {:?} cache entry", file, shape);
            let raw = read(&file)?;
            cache_entry(&raw, shape, Timestamp::now(), &config)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}
