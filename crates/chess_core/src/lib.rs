pub mod board;
pub mod budget;
pub mod error;
pub mod pgn;
pub mod san;
pub mod types;
pub mod uci;

// Re-export the position/record capability used by the match driver
pub use board::*;
pub use budget::*;
pub use error::*;
pub use pgn::*;
pub use san::san_for_move;
pub use types::*;
pub use uci::*;

// The board library itself, so downstream crates agree on one version
pub use cozy_chess::{Board, Color, Move, Piece, Square};
