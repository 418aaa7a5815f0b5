//! End-of-match summary and reporting

use anyhow::{Context, Result};
use chess_core::{Color, GameRecord, MoveSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happened in one match, for humans and for scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub white: String,
    pub black: String,
    /// PGN result token (`1-0`, `0-1`, `1/2-1/2`, `*`)
    pub result: String,
    pub termination: String,
    pub plies: usize,
    pub premoves_applied: usize,
    pub white_fallbacks: usize,
    pub black_fallbacks: usize,
    pub elapsed_ms: u64,
    pub pgn_path: PathBuf,
    /// Set when the match was abandoned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchSummary {
    pub fn from_record(record: &GameRecord, elapsed: Duration, pgn_path: &Path) -> Self {
        Self {
            white: record.white.clone(),
            black: record.black.clone(),
            result: record.outcome.result_tag().to_string(),
            termination: record
                .termination
                .map(|t| t.describe().to_string())
                .unwrap_or_else(|| "unterminated".to_string()),
            plies: record.ply_count(),
            premoves_applied: record
                .moves
                .iter()
                .filter(|m| m.source == MoveSource::Premove)
                .count(),
            white_fallbacks: record.fallback_count(Color::White),
            black_fallbacks: record.fallback_count(Color::Black),
            elapsed_ms: elapsed.as_millis() as u64,
            pgn_path: pgn_path.to_path_buf(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Save summary to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary {}", path.display()))
    }

    /// Generate a text report
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== {} vs {} ===\n", self.white, self.black));
        report.push_str(&format!("Result:      {} ({})\n", self.result, self.termination));
        report.push_str(&format!("Plies:       {}\n", self.plies));
        report.push_str(&format!(
            "Fallbacks:   white {}, black {}\n",
            self.white_fallbacks, self.black_fallbacks
        ));
        report.push_str(&format!(
            "Time:        {:.1}s\n",
            self.elapsed_ms as f64 / 1000.0
        ));
        report.push_str(&format!("PGN:         {}\n", self.pgn_path.display()));
        if let Some(err) = &self.error {
            report.push_str(&format!("Error:       {}\n", err));
        }
        report
    }
}
