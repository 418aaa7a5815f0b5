use thiserror::Error;

/// Errors raised by the position and notation layer.
#[derive(Debug, Error)]
pub enum ChessError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("cannot parse move '{0}'")]
    MoveParse(String),

    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("failed to write game record to {path}: {source}")]
    RecordWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
