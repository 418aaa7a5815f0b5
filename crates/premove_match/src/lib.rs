//! Premove match runner
//!
//! Plays one game between two UCI engines where every move is committed a
//! ply early. This crate provides:
//! - The `MoveProvider` seam and a UCI process implementation of it
//! - The premove state machine with fallback moves for stale premoves
//! - Configuration (CLI + TOML) and the end-of-match summary
//!
//! # Usage
//!
//! ```bash
//! cargo run --release -p premove_match -- \
//!     --white-engine /usr/bin/stockfish --black-engine ./lc0 \
//!     --premove-depth 8 --output game.pgn
//! ```

pub mod config;
mod error;
mod match_runner;
mod provider;
mod results;
mod uci_engine;

pub use error::*;
pub use match_runner::*;
pub use provider::*;
pub use results::*;
pub use uci_engine::*;
