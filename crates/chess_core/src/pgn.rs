//! Game record and PGN output.

use chrono::Local;
use cozy_chess::{Color, Move};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::board::Position;
use crate::error::ChessError;
use crate::san::san_for_move;
use crate::types::{MoveSource, Outcome, Termination};
use crate::uci::move_to_uci;

const LINE_WIDTH: usize = 80;

/// One applied move as it appears in the record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMove {
    pub san: String,
    pub uci: String,
    pub side: String,
    pub source: MoveSource,
}

/// Ordered list of applied moves plus result metadata.
///
/// Built incrementally while the game is played, finalised once.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    /// Starting FEN when the game did not begin from the initial position
    pub start_fen: Option<String>,
    /// Side to move in the starting position
    #[serde(skip)]
    pub first_to_move: Color,
    /// Full move number of the first recorded move
    pub first_move_number: u16,
    pub moves: Vec<RecordedMove>,
    pub outcome: Outcome,
    pub termination: Option<Termination>,
}

impl GameRecord {
    /// Start an empty record for a game beginning at `start`.
    pub fn new(white: &str, black: &str, start: &Position) -> Self {
        Self {
            event: "Premove match".to_string(),
            site: "Local".to_string(),
            date: Local::now().format("%Y.%m.%d").to_string(),
            round: "1".to_string(),
            white: white.to_string(),
            black: black.to_string(),
            start_fen: start.start_fen().map(str::to_string),
            first_to_move: start.side_to_move(),
            first_move_number: start.board().fullmove_number(),
            moves: Vec::new(),
            outcome: Outcome::Undetermined,
            termination: None,
        }
    }

    pub fn with_event(mut self, event: &str) -> Self {
        self.event = event.to_string();
        self
    }

    /// Record `mv`, which is about to be played in `before`.
    pub fn push(&mut self, before: &Position, mv: Move, source: MoveSource) {
        let board = before.board();
        self.moves.push(RecordedMove {
            san: san_for_move(board, mv),
            uci: move_to_uci(board, mv),
            side: crate::types::color_name(board.side_to_move()).to_string(),
            source,
        });
    }

    pub fn finish(&mut self, outcome: Outcome, termination: Termination) {
        self.outcome = outcome;
        self.termination = Some(termination);
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn fallback_count(&self, side: Color) -> usize {
        let side = crate::types::color_name(side);
        self.moves
            .iter()
            .filter(|m| m.side == side && m.source == MoveSource::Fallback)
            .count()
    }

    /// Render as PGN. With `annotate_fallbacks` every substituted move gets a
    /// `{fallback}` comment; otherwise both paths look the same.
    pub fn to_pgn(&self, annotate_fallbacks: bool) -> String {
        let mut out = String::new();
        let mut tag = |name: &str, value: &str| {
            let _ = writeln!(out, "[{} \"{}\"]", name, escape(value));
        };
        tag("Event", &self.event);
        tag("Site", &self.site);
        tag("Date", &self.date);
        tag("Round", &self.round);
        tag("White", &self.white);
        tag("Black", &self.black);
        tag("Result", self.outcome.result_tag());
        if let Some(termination) = self.termination {
            tag("Termination", termination.describe());
        }
        tag("PlyCount", &self.ply_count().to_string());
        if let Some(fen) = &self.start_fen {
            tag("SetUp", "1");
            tag("FEN", fen);
        }
        out.push('\n');

        let mut tokens = Vec::with_capacity(self.moves.len() * 2 + 1);
        let mut number = self.first_move_number;
        let mut white_to_move = self.first_to_move == Color::White;
        for (i, mv) in self.moves.iter().enumerate() {
            if white_to_move {
                tokens.push(format!("{}.", number));
            } else if i == 0 {
                tokens.push(format!("{}...", number));
            }
            tokens.push(mv.san.clone());
            if annotate_fallbacks && mv.source == MoveSource::Fallback {
                tokens.push("{fallback}".to_string());
            }
            if !white_to_move {
                number += 1;
            }
            white_to_move = !white_to_move;
        }
        tokens.push(self.outcome.result_tag().to_string());

        let mut line_len = 0;
        for token in tokens {
            if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
                out.push('\n');
                line_len = 0;
            } else if line_len > 0 {
                out.push(' ');
                line_len += 1;
            }
            out.push_str(&token);
            line_len += token.len();
        }
        out.push('\n');
        out
    }

    /// Write the PGN to `path`, replacing any existing file.
    pub fn write_pgn(&self, path: &Path, annotate_fallbacks: bool) -> Result<(), ChessError> {
        std::fs::write(path, self.to_pgn(annotate_fallbacks)).map_err(|source| {
            ChessError::RecordWrite {
                path: path.display().to_string(),
                source,
            }
        })
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;
