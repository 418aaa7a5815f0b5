//! Command line and configuration file handling.
//!
//! Settings come from the command line, optionally backed by a TOML file.
//! Anything given explicitly on the command line wins over the file.

use anyhow::{bail, Context, Result};
use chess_core::{Position, SearchBudget};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::match_runner::MatchConfig;
use crate::uci_engine::UciEngineConfig;

pub const DEFAULT_PREMOVE_DEPTH: u8 = 6;
pub const DEFAULT_FALLBACK_DEPTH: u8 = 1;
pub const DEFAULT_MAX_PLIES: u32 = 200;
pub const DEFAULT_OUTPUT: &str = "premove_match.pgn";
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 60;

#[derive(Parser, Debug, Default)]
#[command(
    name = "premove-match",
    about = "Play a premove match between two UCI engines and write the game as PGN"
)]
pub struct Cli {
    /// Path to the engine playing White
    #[arg(long)]
    pub white_engine: Option<PathBuf>,

    /// Path to the engine playing Black
    #[arg(long)]
    pub black_engine: Option<PathBuf>,

    /// Display name for White (default: engine id name)
    #[arg(long)]
    pub white_name: Option<String>,

    /// Display name for Black (default: engine id name)
    #[arg(long)]
    pub black_name: Option<String>,

    /// Extra argument for the White engine process (repeatable)
    #[arg(long = "white-arg", allow_hyphen_values = true)]
    pub white_args: Vec<String>,

    /// Extra argument for the Black engine process (repeatable)
    #[arg(long = "black-arg", allow_hyphen_values = true)]
    pub black_args: Vec<String>,

    /// UCI option NAME=VALUE for the White engine (repeatable)
    #[arg(long = "white-option")]
    pub white_options: Vec<String>,

    /// UCI option NAME=VALUE for the Black engine (repeatable)
    #[arg(long = "black-option")]
    pub black_options: Vec<String>,

    /// Search depth for premoves
    #[arg(long)]
    pub premove_depth: Option<u8>,

    /// Movetime for premoves in milliseconds (overrides nodes and depth)
    #[arg(long)]
    pub premove_movetime: Option<u64>,

    /// Node limit for premoves (overrides depth)
    #[arg(long)]
    pub premove_nodes: Option<u64>,

    /// Search depth for fallback moves
    #[arg(long)]
    pub fallback_depth: Option<u8>,

    /// Movetime for fallback moves in milliseconds (overrides nodes and depth)
    #[arg(long)]
    pub fallback_movetime: Option<u64>,

    /// Node limit for fallback moves (overrides depth)
    #[arg(long)]
    pub fallback_nodes: Option<u64>,

    /// Max plies before the game is stopped without a result
    #[arg(long)]
    pub max_plies: Option<u32>,

    /// Start from this FEN instead of the initial position
    #[arg(long)]
    pub fen: Option<String>,

    /// Where to write the PGN
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// PGN Event tag
    #[arg(long)]
    pub event: Option<String>,

    /// Mark fallback moves with a {fallback} comment in the PGN
    #[arg(long)]
    pub annotate_fallbacks: bool,

    /// Optional: write a JSON summary to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Seconds of engine silence before a request counts as failed (0 = wait forever)
    #[arg(long)]
    pub engine_timeout_secs: Option<u64>,

    /// TOML file with default settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Engine section of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub path: Option<PathBuf>,
    pub name: Option<String>,
    pub args: Vec<String>,
    pub options: BTreeMap<String, String>,
}

/// Configuration file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub white: EngineSection,
    pub black: EngineSection,
    pub premove_depth: Option<u8>,
    pub premove_movetime_ms: Option<u64>,
    pub premove_nodes: Option<u64>,
    pub fallback_depth: Option<u8>,
    pub fallback_movetime_ms: Option<u64>,
    pub fallback_nodes: Option<u64>,
    pub max_plies: Option<u32>,
    pub fen: Option<String>,
    pub output: Option<PathBuf>,
    pub event: Option<String>,
    pub annotate_fallbacks: Option<bool>,
    pub summary_json: Option<PathBuf>,
    pub engine_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Everything needed to run one match.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub white: UciEngineConfig,
    pub black: UciEngineConfig,
    pub match_config: MatchConfig,
    pub output: PathBuf,
    pub annotate_fallbacks: bool,
    pub summary_json: Option<PathBuf>,
}

impl MatchSettings {
    /// Resolve the command line, loading the file it points to if any.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let timeout_secs = cli
            .engine_timeout_secs
            .or(file.engine_timeout_secs)
            .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS);
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let white = engine_config(
            "white",
            cli.white_engine.as_ref(),
            cli.white_name.as_ref(),
            &cli.white_args,
            &cli.white_options,
            file.white,
            timeout,
        )?;
        let black = engine_config(
            "black",
            cli.black_engine.as_ref(),
            cli.black_name.as_ref(),
            &cli.black_args,
            &cli.black_options,
            file.black,
            timeout,
        )?;

        let premove_budget = budget(
            cli.premove_movetime.or(file.premove_movetime_ms),
            cli.premove_nodes.or(file.premove_nodes),
            cli.premove_depth.or(file.premove_depth),
            DEFAULT_PREMOVE_DEPTH,
        );
        let fallback_budget = budget(
            cli.fallback_movetime.or(file.fallback_movetime_ms),
            cli.fallback_nodes.or(file.fallback_nodes),
            cli.fallback_depth.or(file.fallback_depth),
            DEFAULT_FALLBACK_DEPTH,
        );

        let start_fen = cli.fen.clone().or(file.fen);
        if let Some(fen) = &start_fen {
            Position::from_fen(fen)?;
        }

        let mut match_config = MatchConfig {
            premove_budget,
            fallback_budget,
            max_plies: cli.max_plies.or(file.max_plies).unwrap_or(DEFAULT_MAX_PLIES),
            start_fen,
            ..Default::default()
        };
        if let Some(event) = cli.event.clone().or(file.event) {
            match_config.event = event;
        }

        Ok(Self {
            white,
            black,
            match_config,
            output: cli
                .output
                .clone()
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            annotate_fallbacks: cli.annotate_fallbacks || file.annotate_fallbacks.unwrap_or(false),
            summary_json: cli.summary_json.clone().or(file.summary_json),
        })
    }
}

/// Pick one budget: movetime, then nodes, then depth.
fn budget(
    movetime_ms: Option<u64>,
    nodes: Option<u64>,
    depth: Option<u8>,
    default_depth: u8,
) -> SearchBudget {
    match (movetime_ms, nodes) {
        (Some(ms), _) => SearchBudget::movetime_ms(ms),
        (None, Some(n)) => SearchBudget::nodes(n),
        (None, None) => SearchBudget::depth(depth.unwrap_or(default_depth)),
    }
}

fn engine_config(
    side: &str,
    path: Option<&PathBuf>,
    name: Option<&String>,
    args: &[String],
    options: &[String],
    section: EngineSection,
    timeout: Option<Duration>,
) -> Result<UciEngineConfig> {
    let path = match path.cloned().or(section.path) {
        Some(p) => p,
        None => bail!("no engine given for {} (use --{}-engine or the config file)", side, side),
    };

    // File options first so command line values are sent last and win
    let mut pairs: Vec<(String, String)> = section.options.into_iter().collect();
    for opt in options {
        pairs.push(parse_option(opt).with_context(|| format!("bad --{}-option", side))?);
    }

    let mut all_args = section.args;
    all_args.extend(args.iter().cloned());

    Ok(UciEngineConfig {
        path,
        args: all_args,
        name: name.cloned().or(section.name),
        options: pairs,
        timeout,
    })
}

/// Split `NAME=VALUE`.
pub fn parse_option(opt: &str) -> Result<(String, String)> {
    match opt.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("expected NAME=VALUE, got '{}'", opt),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
