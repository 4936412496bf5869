//! CLI argument parsing for casefile.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use casefile::config::{
    CompressionLevel, Config, DEFAULT_STALE_TEMP_AGE, ENV_COMPRESSION, ENV_STALE_TEMP_SECS,
    ENV_STORAGE_ROOT,
};
use casefile::record::CaseRecord;

/// Consolidate a record's uploaded documents into one ordered PDF.
///
/// Records are read as JSON, from a file or from stdin, and reports are
/// written to stdout as JSON. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "casefile")]
#[command(version)]
#[command(about = "Consolidate a record's uploaded documents into one ordered PDF", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory holding uploads, temp files and merged outputs
    #[arg(long, env = ENV_STORAGE_ROOT, value_name = "DIR")]
    pub storage_root: PathBuf,

    /// Compression for merged outputs: none or standard
    #[arg(long, env = ENV_COMPRESSION, default_value = "none", value_parser = parse_compression)]
    pub compression: CompressionLevel,

    /// Age in seconds after which leftover temp files are swept
    #[arg(long, env = ENV_STALE_TEMP_SECS, value_name = "SECS", default_value_t = DEFAULT_STALE_TEMP_AGE.as_secs())]
    pub stale_temp_secs: u64,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report which slots of a record can be merged
    Inspect {
        /// Record JSON file; `-` or omitted reads stdin
        #[arg(value_name = "RECORD")]
        record: Option<PathBuf>,
    },

    /// Merge a record's slots into one PDF in the storage root
    Merge {
        /// Record JSON file; `-` or omitted reads stdin
        #[arg(value_name = "RECORD")]
        record: Option<PathBuf>,
    },

    /// Remove temp and staging files left behind by interrupted jobs
    Sweep,
}

impl Cli {
    /// Convert CLI arguments into a validated engine configuration.
    pub fn to_config(&self) -> Result<Config> {
        let config = Config {
            storage_root: self.storage_root.clone(),
            compression: self.compression,
            stale_temp_age: Duration::from_secs(self.stale_temp_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_compression(s: &str) -> Result<CompressionLevel> {
    s.parse()
}

/// Read a record from `path`, or from stdin when `path` is absent or `-`.
pub fn read_record(path: Option<&PathBuf>) -> Result<CaseRecord> {
    let json = match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record file {}", path.display()))?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read record from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&json).context("Record is not valid JSON")
}
