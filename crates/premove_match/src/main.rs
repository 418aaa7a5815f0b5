//! Premove match CLI
//!
//! Spawns two UCI engines, plays one premove game and writes it as PGN.

use anyhow::{Context, Result};
use clap::Parser;
use premove_match::config::{Cli, MatchSettings};
use premove_match::{MatchSummary, MoveProvider, PremoveMatch, UciEngine};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Write the PGN and optional summary, then print the report.
fn finish(
    settings: &MatchSettings,
    record: &chess_core::GameRecord,
    started: Instant,
    error: Option<String>,
) -> Result<()> {
    record
        .write_pgn(&settings.output, settings.annotate_fallbacks)
        .context("failed to write PGN")?;
    info!(path = %settings.output.display(), "PGN written");

    let pgn_path = absolute(&settings.output);
    let mut summary = MatchSummary::from_record(record, started.elapsed(), &pgn_path);
    if let Some(err) = error {
        summary = summary.with_error(err);
    }
    if let Some(path) = &settings.summary_json {
        summary.save(path)?;
    }
    println!("{}", summary.report());
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn run(settings: &MatchSettings) -> Result<bool> {
    let started = Instant::now();

    let white = UciEngine::spawn(&settings.white).context("failed to start white engine")?;
    let black = UciEngine::spawn(&settings.black).context("failed to start black engine")?;
    let white: Box<dyn MoveProvider> = Box::new(white);
    let black: Box<dyn MoveProvider> = Box::new(black);

    let game = PremoveMatch::new(settings.match_config.clone(), white, black)?;
    match game.run() {
        Ok(record) => {
            finish(settings, &record, started, None)?;
            Ok(true)
        }
        Err(abort) => {
            let msg = format!("{:#}", anyhow::Error::new(abort.error));
            finish(settings, &abort.record, started, Some(msg))?;
            Ok(false)
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let settings = match MatchSettings::from_cli(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    match run(&settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}
