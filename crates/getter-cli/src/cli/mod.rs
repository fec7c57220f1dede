//! CLI for the getter parallel downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use getter_core::config::{self, GetterConfig};
use std::path::PathBuf;

use commands::{run_checksum, run_fetch, run_probe, FetchArgs};

/// Top-level CLI for getter.
#[derive(Debug, Parser)]
#[command(name = "getter")]
#[command(about = "getter: parallel HTTP/1.0 range downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a resource in parallel byte-range chunks.
    Fetch {
        /// Resource URL: `host/path`, `host:port/path` or `http://host/path`.
        url: String,
        /// Output file (default: last path segment, or download.bin).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Worker threads (default from config).
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,
        /// Print the SHA-256 of the written file.
        #[arg(long)]
        sha256: bool,
    },

    /// Probe a resource with HEAD and print the chunk plan without downloading.
    Probe {
        /// Resource URL.
        url: String,
        /// Worker threads to plan for (default from config).
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,
        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

/// Config from disk; built-in defaults when it cannot be read or created.
fn load_config() -> GetterConfig {
    match config::load_or_init() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("using default config: {:#}", e);
            GetterConfig::default()
        }
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                url,
                output,
                workers,
                sha256,
            } => {
                let cfg = load_config();
                tracing::debug!("loaded config: {:?}", cfg);
                run_fetch(
                    &cfg,
                    &FetchArgs {
                        url,
                        output,
                        workers,
                        sha256,
                    },
                )?
            }
            CliCommand::Probe { url, workers, json } => {
                let cfg = load_config();
                run_probe(&cfg, &url, workers, json)?
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
