//! casefile - consolidate a record's uploads into one ordered PDF.

mod cli;

use anyhow::Result;
use clap::Parser;
use std::process;

use crate::cli::{Cli, Command, read_record};
use casefile::engine::CaseFileEngine;
use casefile::error::MergeError;
use casefile::logging::init_logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logger(cli.verbose, cli.json_logs) {
        eprintln!("Warning: logging unavailable: {err}");
    }

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let engine = CaseFileEngine::new(cli.to_config()?);

    let report = match &cli.command {
        Command::Inspect { record } => {
            let record = read_record(record.as_ref())?;
            serde_json::to_string_pretty(&engine.inspect(&record))?
        }
        Command::Merge { record } => {
            let record = read_record(record.as_ref())?;
            let outcome = engine.merge_with_outcome(&record).await?;
            serde_json::to_string_pretty(&outcome)?
        }
        Command::Sweep => {
            let removed = engine.sweep_stale()?;
            serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))?
        }
    };

    println!("{report}");
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<MergeError>()
        .map(MergeError::exit_code)
        .unwrap_or(1)
}
