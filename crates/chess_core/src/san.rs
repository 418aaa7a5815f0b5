//! Standard Algebraic Notation for the game record.

use cozy_chess::{Board, Move, Piece, Square};

use crate::board::{has_legal_moves, legal_moves};

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

/// SAN of a legal move `mv` in `board`, including the check/mate suffix.
pub fn san_for_move(board: &Board, mv: Move) -> String {
    let stm = board.side_to_move();
    let moving = board.piece_on(mv.from);

    let mut san = String::new();
    let castles = moving == Some(Piece::King) && board.color_on(mv.to) == Some(stm);

    if castles {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else if moving == Some(Piece::Pawn) || moving.is_none() {
        // Diagonal pawn moves are captures, en passant included
        let capture = mv.from.file() != mv.to.file();
        if capture {
            san.push(file_char(mv.from));
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(piece_letter(promo));
        }
    } else if let Some(piece) = moving {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece));
        if board.color_on(mv.to) == Some(!stm) {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if has_legal_moves(&after) { '+' } else { '#' });
    }
    san
}

/// Minimal origin qualifier when another piece of the same kind can reach
/// the same square: file if that suffices, else rank, else both.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    if piece == Piece::King {
        return String::new();
    }
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();
    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    let mut out = String::new();
    if !shares_file {
        out.push(file_char(mv.from));
    } else if !shares_rank {
        out.push(rank_char(mv.from));
    } else {
        out.push(file_char(mv.from));
        out.push(rank_char(mv.from));
    }
    out
}

#[cfg(test)]
#[path = "san_tests.rs"]
mod san_tests;
