use chess_core::ChessError;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to a move provider. Always fatal for the match.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to start engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: i/o error: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: no response within {waited:?}")]
    Timeout { name: String, waited: Duration },

    #[error("{name}: engine exited unexpectedly")]
    Exited { name: String },

    #[error("{name}: malformed response '{line}'")]
    Malformed { name: String, line: String },
}

/// Reasons a match cannot be completed.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{side} provider failed: {source}")]
    Provider {
        side: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("{side} provider ({name}) offered no fallback move in {fen}")]
    FallbackUnavailable {
        side: &'static str,
        name: String,
        fen: String,
    },

    #[error("{side} provider ({name}) offered illegal fallback move {mv} in {fen}")]
    IllegalFallback {
        side: &'static str,
        name: String,
        mv: String,
        fen: String,
    },

    #[error("no legal moves in {fen} but the game was not flagged as finished")]
    NoLegalMoves { fen: String },

    #[error(transparent)]
    Chess(#[from] ChessError),
}
