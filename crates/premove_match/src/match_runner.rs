//! Premove match runner
//!
//! Drives one game between two move providers under the premove rule: each
//! side commits to its next move while the opponent is still to move, and the
//! committed move is only checked against the board once it is that side's
//! turn. A premove that no longer fits is replaced by a low-budget fallback.

use chess_core::{
    board_position_command, color_name, position_command, Color, GameRecord, Move, MoveSource,
    Outcome, Position, SearchBudget, Termination,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::error::MatchError;
use crate::provider::{MoveProvider, MoveQuery, QueryPurpose};

/// Configuration for a match
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Budget for committed premoves (and the opening move)
    pub premove_budget: SearchBudget,
    /// Budget for replacement moves when a premove turns out illegal
    pub fallback_budget: SearchBudget,
    /// Maximum plies before the game is cut off without a result
    pub max_plies: u32,
    /// Custom starting position (None = standard initial position)
    pub start_fen: Option<String>,
    /// PGN `Event` tag
    pub event: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            premove_budget: SearchBudget::depth(6),
            fallback_budget: SearchBudget::depth(1),
            max_plies: 200,
            start_fen: None,
            event: "Premove match".to_string(),
        }
    }
}

/// Where the driver is in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    Init,
    AwaitingFirstMove,
    RequestNextPremove,
    ValidateAndApply,
    CheckTermination,
    Terminated,
}

/// Committed premoves, at most one per side.
#[derive(Clone, Debug, Default)]
pub struct PremoveSlots {
    white: Option<Move>,
    black: Option<Move>,
}

impl PremoveSlots {
    fn slot(&mut self, side: Color) -> &mut Option<Move> {
        match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Store `mv` as the side's premove, replacing whatever was there.
    pub fn commit(&mut self, side: Color, mv: Option<Move>) {
        *self.slot(side) = mv;
    }

    /// Remove and return the side's premove.
    pub fn take(&mut self, side: Color) -> Option<Move> {
        self.slot(side).take()
    }

    pub fn get(&self, side: Color) -> Option<Move> {
        match side {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// A match that could not be completed, with everything recorded so far.
#[derive(Debug, Error)]
#[error("match abandoned: {error}")]
pub struct MatchAbort {
    #[source]
    pub error: MatchError,
    pub record: GameRecord,
}

/// One premove game between two providers.
///
/// The providers are owned for the lifetime of the match and shut down exactly
/// once when it ends, whichever way it ends.
pub struct PremoveMatch {
    config: MatchConfig,
    white: Box<dyn MoveProvider>,
    black: Box<dyn MoveProvider>,
    position: Position,
    slots: PremoveSlots,
    record: GameRecord,
    state: MatchState,
    released: bool,
}

impl PremoveMatch {
    /// White is driven by `white` (provider A), Black by `black` (provider B).
    pub fn new(
        config: MatchConfig,
        mut white: Box<dyn MoveProvider>,
        mut black: Box<dyn MoveProvider>,
    ) -> Result<Self, MatchError> {
        let position = match config.start_fen.as_deref() {
            Some(fen) => Position::from_fen(fen),
            None => Ok(Position::startpos()),
        };
        let position = match position {
            Ok(p) => p,
            Err(e) => {
                white.shutdown();
                black.shutdown();
                return Err(e.into());
            }
        };
        let record =
            GameRecord::new(white.name(), black.name(), &position).with_event(&config.event);

        Ok(Self {
            config,
            white,
            black,
            position,
            slots: PremoveSlots::default(),
            record,
            state: MatchState::Init,
            released: false,
        })
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    /// The premove currently committed for `side`, if any.
    pub fn committed(&self, side: Color) -> Option<Move> {
        self.slots.get(side)
    }

    /// Play the whole game.
    pub fn run(mut self) -> Result<GameRecord, MatchAbort> {
        info!(
            white = %self.record.white,
            black = %self.record.black,
            premove = %self.config.premove_budget,
            fallback = %self.config.fallback_budget,
            max_plies = self.config.max_plies,
            "match started"
        );

        while self.state != MatchState::Terminated {
            if let Err(err) = self.step() {
                error!(ply = self.position.plies_played(), error = %err, "match aborted");
                self.record.finish(Outcome::Undetermined, Termination::Abandoned);
                self.release();
                return Err(MatchAbort {
                    error: err,
                    record: self.record.clone(),
                });
            }
        }

        self.release();
        info!(
            result = %self.record.outcome,
            plies = self.record.ply_count(),
            "match finished"
        );
        Ok(self.record.clone())
    }

    /// Advance the state machine by one transition and return the new state.
    pub fn step(&mut self) -> Result<MatchState, MatchError> {
        let next = match self.state {
            MatchState::Init => self.init()?,
            MatchState::AwaitingFirstMove => self.first_move()?,
            MatchState::RequestNextPremove => self.request_next_premove()?,
            MatchState::ValidateAndApply => self.validate_and_apply()?,
            MatchState::CheckTermination => self.check_termination(),
            MatchState::Terminated => MatchState::Terminated,
        };
        self.state = next;
        Ok(next)
    }

    fn init(&mut self) -> Result<MatchState, MatchError> {
        self.white
            .new_game()
            .map_err(|source| MatchError::Provider { side: "white", source })?;
        self.black
            .new_game()
            .map_err(|source| MatchError::Provider { side: "black", source })?;

        // A custom start can already be over
        Ok(self.check_termination_or(MatchState::AwaitingFirstMove))
    }

    fn first_move(&mut self) -> Result<MatchState, MatchError> {
        let side = self.position.side_to_move();
        let query = MoveQuery {
            board: self.position.board().clone(),
            setup: position_command(&self.position),
            budget: self.config.premove_budget,
            purpose: QueryPurpose::Premove,
        };
        let mv = self.ask(side, &query)?;
        self.slots.commit(side, mv);
        Ok(MatchState::RequestNextPremove)
    }

    /// Ask the side that moves after the pending move for its own premove,
    /// based on the board as it is now.
    fn request_next_premove(&mut self) -> Result<MatchState, MatchError> {
        let next = !self.position.side_to_move();
        let mv = match self.position.null_move_view() {
            Some(view) => {
                let query = MoveQuery {
                    setup: board_position_command(&view),
                    board: view,
                    budget: self.config.premove_budget,
                    purpose: QueryPurpose::Premove,
                };
                self.ask(next, &query)?
            }
            None => {
                debug!(side = color_name(next), "opponent in check, no premove view");
                None
            }
        };
        self.slots.commit(next, mv);
        Ok(MatchState::ValidateAndApply)
    }

    fn validate_and_apply(&mut self) -> Result<MatchState, MatchError> {
        let side = self.position.side_to_move();
        if !self.position.has_legal_moves() {
            return Err(MatchError::NoLegalMoves {
                fen: self.position.fen(),
            });
        }

        let (mv, source) = match self.slots.take(side) {
            Some(mv) if self.position.is_legal(mv) => (mv, MoveSource::Premove),
            premove => {
                warn!(
                    ply = self.position.plies_played() + 1,
                    side = color_name(side),
                    premove = ?premove.map(|m| m.to_string()),
                    "premove unusable, requesting fallback"
                );
                (self.fallback(side)?, MoveSource::Fallback)
            }
        };

        self.record.push(&self.position, mv, source);
        let san = self.record.moves.last().map(|m| m.san.clone()).unwrap_or_default();
        self.position.play(mv)?;
        info!(
            ply = self.position.plies_played(),
            side = color_name(side),
            mv = %san,
            source = ?source,
            "move applied"
        );
        Ok(MatchState::CheckTermination)
    }

    fn fallback(&mut self, side: Color) -> Result<Move, MatchError> {
        let query = MoveQuery {
            board: self.position.board().clone(),
            setup: position_command(&self.position),
            budget: self.config.fallback_budget,
            purpose: QueryPurpose::Fallback,
        };
        let name = self.provider(side).name().to_string();
        match self.ask(side, &query)? {
            Some(mv) if self.position.is_legal(mv) => Ok(mv),
            Some(mv) => Err(MatchError::IllegalFallback {
                side: color_name(side),
                name,
                mv: mv.to_string(),
                fen: self.position.fen(),
            }),
            None => Err(MatchError::FallbackUnavailable {
                side: color_name(side),
                name,
                fen: self.position.fen(),
            }),
        }
    }

    fn check_termination(&mut self) -> MatchState {
        self.check_termination_or(MatchState::RequestNextPremove)
    }

    fn check_termination_or(&mut self, otherwise: MatchState) -> MatchState {
        if let Some((outcome, termination)) = self.position.termination() {
            self.record.finish(outcome, termination);
            return MatchState::Terminated;
        }
        if self.position.plies_played() as u32 >= self.config.max_plies {
            self.record.finish(Outcome::Undetermined, Termination::PlyLimit);
            return MatchState::Terminated;
        }
        otherwise
    }

    fn ask(&mut self, side: Color, query: &MoveQuery) -> Result<Option<Move>, MatchError> {
        debug!(
            side = color_name(side),
            purpose = %query.purpose,
            budget = %query.budget,
            fen = %query.board,
            "requesting move"
        );
        self.provider(side)
            .propose(query)
            .map_err(|source| MatchError::Provider {
                side: color_name(side),
                source,
            })
    }

    fn provider(&mut self, side: Color) -> &mut dyn MoveProvider {
        match side {
            Color::White => self.white.as_mut(),
            Color::Black => self.black.as_mut(),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.white.shutdown();
            self.black.shutdown();
        }
    }
}

impl Drop for PremoveMatch {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "match_runner_tests.rs"]
mod match_runner_tests;
