//! The move provider seam.
//!
//! The driver never inspects how a provider finds its move; it only hands over
//! a position and a budget and gets back one move (or nothing).

use chess_core::{Board, Move, SearchBudget};
use std::fmt;

use crate::error::ProviderError;

/// Why the driver is asking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPurpose {
    /// A move committed ahead of time, validated later
    Premove,
    /// A replacement for a premove that no longer fits the board
    Fallback,
}

impl fmt::Display for QueryPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPurpose::Premove => f.write_str("premove"),
            QueryPurpose::Fallback => f.write_str("fallback"),
        }
    }
}

/// One "suggest a move" request.
#[derive(Clone, Debug)]
pub struct MoveQuery {
    /// Board to answer for; the asking side is its side to move
    pub board: Board,
    /// UCI `position` command reproducing `board`, history included when known
    pub setup: String,
    pub budget: SearchBudget,
    pub purpose: QueryPurpose,
}

/// Trait that every move source driven by the match runner implements.
///
/// This allows the driver to run against external UCI processes in
/// production and against scripted providers in tests.
pub trait MoveProvider {
    /// Display name used in logs and in the game record
    fn name(&self) -> &str;

    /// Reset internal state for a new game
    fn new_game(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Propose a move for the side to move in `query.board`.
    ///
    /// `Ok(None)` means the provider has no move to offer (for example the
    /// board has no legal moves). Transport or protocol problems are errors.
    fn propose(&mut self, query: &MoveQuery) -> Result<Option<Move>, ProviderError>;

    /// Release whatever the provider holds. Must tolerate repeated calls.
    fn shutdown(&mut self) {}
}
