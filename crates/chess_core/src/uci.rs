//! UCI move notation.
//!
//! The board library encodes castling as the king capturing its own rook
//! (`e1h1`), while UCI engines in standard chess speak `e1g1`. Everything
//! crossing the process boundary goes through these helpers.

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::board::Position;
use crate::error::ChessError;

/// Render a move in standard UCI notation.
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    let mut out = mv;
    if is_castle(board, mv) {
        let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
            File::G
        } else {
            File::C
        };
        out.to = Square::new(file, mv.from.rank());
    }
    out.to_string()
}

/// Parse UCI move text relative to `board`.
///
/// Only the syntax is checked; legality is left to the caller so that an
/// outdated premove can be told apart from garbage. Returns `Ok(None)` for
/// the null move (`0000`, `(none)`).
pub fn parse_uci_move(board: &Board, txt: &str) -> Result<Option<Move>, ChessError> {
    let txt = txt.trim();
    if txt == "0000" || txt == "(none)" {
        return Ok(None);
    }
    let mut mv: Move = txt
        .parse()
        .map_err(|_| ChessError::MoveParse(txt.to_string()))?;

    // King two files sideways on its home rank: translate to king-takes-rook
    let stm = board.side_to_move();
    let is_king =
        board.piece_on(mv.from) == Some(Piece::King) && board.color_on(mv.from) == Some(stm);
    let file_delta = (mv.to.file() as i8 - mv.from.file() as i8).abs();
    if is_king && mv.from.rank() == mv.to.rank() && file_delta == 2 {
        let rights = board.castle_rights(stm);
        let rook_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
            rights.short
        } else {
            rights.long
        };
        if let Some(rook_file) = rook_file {
            mv.to = Square::new(rook_file, mv.from.rank());
        }
    }
    Ok(Some(mv))
}

/// The `position` command that reproduces `pos` with its full move history.
pub fn position_command(pos: &Position) -> String {
    let mut cmd = match pos.start_fen() {
        Some(fen) => format!("position fen {}", fen),
        None => "position startpos".to_string(),
    };
    if !pos.uci_moves().is_empty() {
        cmd.push_str(" moves ");
        cmd.push_str(&pos.uci_moves().join(" "));
    }
    cmd
}

/// The `position` command for a bare board without history.
pub fn board_position_command(board: &Board) -> String {
    format!("position fen {}", board)
}

fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.piece_on(mv.to) == Some(Piece::Rook)
        && board.color_on(mv.from) == board.color_on(mv.to)
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
