use cozy_chess::{BitBoard, Board, Color, Move, Piece, Square};

use crate::error::ChessError;
use crate::types::{Outcome, Termination};
use crate::uci::move_to_uci;

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Game position plus the history needed for draw claims and for replaying
/// the game to a UCI engine.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    /// `None` when the game started from the standard initial position
    start_fen: Option<String>,
    /// Applied moves in standard UCI notation
    uci_moves: Vec<String>,
    /// Repetition keys of every position reached, current one last
    history: Vec<u64>,
}

impl Position {
    pub fn startpos() -> Self {
        let board = Board::default();
        let hash = repetition_key(&board);
        Position {
            board,
            start_fen: None,
            uci_moves: Vec::new(),
            history: vec![hash],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fen = fen.trim();
        let board = Board::from_fen(fen, false).map_err(|e| ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{:?}", e),
        })?;
        let start_fen = if board.to_string() == STARTPOS_FEN {
            None
        } else {
            Some(board.to_string())
        };
        let hash = repetition_key(&board);
        Ok(Position {
            board,
            start_fen,
            uci_moves: Vec::new(),
            history: vec![hash],
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn uci_moves(&self) -> &[String] {
        &self.uci_moves
    }

    pub fn plies_played(&self) -> usize {
        self.uci_moves.len()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    pub fn has_legal_moves(&self) -> bool {
        has_legal_moves(&self.board)
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.board.is_legal(mv)
    }

    /// Apply a legal move. Illegal moves leave the position untouched.
    pub fn play(&mut self, mv: Move) -> Result<(), ChessError> {
        if !self.board.is_legal(mv) {
            return Err(ChessError::IllegalMove {
                mv: mv.to_string(),
                fen: self.fen(),
            });
        }
        let uci = move_to_uci(&self.board, mv);
        self.board.play_unchecked(mv);
        self.uci_moves.push(uci);
        self.history.push(repetition_key(&self.board));
        Ok(())
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check() && !self.has_legal_moves()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && !self.has_legal_moves()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.board.halfmove_clock() >= 100
    }

    /// How many times the current position has occurred, including now.
    pub fn repetition_count(&self) -> usize {
        let current = repetition_key(&self.board);
        self.history.iter().filter(|&&h| h == current).count()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    /// Neither side can possibly deliver mate.
    pub fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy =
            board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }

        let knights = board.pieces(Piece::Knight);
        let bishops = board.pieces(Piece::Bishop);
        if (knights | bishops).len() <= 1 {
            return true;
        }

        // Any number of bishops confined to one square colour cannot mate
        knights.is_empty() && bishops_on_one_colour(bishops)
    }

    /// Terminal state of the current position, if any.
    ///
    /// Draw claims (fifty-move rule, threefold repetition) are treated as
    /// claimed automatically.
    pub fn termination(&self) -> Option<(Outcome, Termination)> {
        if !self.has_legal_moves() {
            return Some(if self.in_check() {
                // The side to move is mated; the side that just moved wins
                (Outcome::win_for(!self.side_to_move()), Termination::Checkmate)
            } else {
                (Outcome::Draw, Termination::Stalemate)
            });
        }
        if self.is_insufficient_material() {
            return Some((Outcome::Draw, Termination::InsufficientMaterial));
        }
        if self.is_fifty_move_draw() {
            return Some((Outcome::Draw, Termination::FiftyMoveRule));
        }
        if self.is_threefold_repetition() {
            return Some((Outcome::Draw, Termination::ThreefoldRepetition));
        }
        None
    }

    /// The same placement with the side to move passing its turn.
    ///
    /// This is the position a premoving side reasons about while its opponent
    /// is still thinking. Returns `None` when the side to move is in check,
    /// since passing would leave its king capturable.
    pub fn null_move_view(&self) -> Option<Board> {
        self.board.null_move()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

pub fn has_legal_moves(board: &Board) -> bool {
    board.generate_moves(|piece_moves| !piece_moves.is_empty())
}

/// Hash identifying a position for repetition purposes.
///
/// The board keeps an en passant square after every double pawn push; it
/// only makes positions differ when an en passant capture is actually legal.
fn repetition_key(board: &Board) -> u64 {
    let fen = board.to_string();
    let mut fields: Vec<&str> = fen.split_whitespace().collect();
    let has_ep_square = fields.get(3).is_some_and(|&ep| ep != "-");
    if !has_ep_square || has_en_passant_capture(board) {
        return board.hash();
    }
    fields[3] = "-";
    Board::from_fen(&fields.join(" "), false)
        .map(|b| b.hash())
        .unwrap_or_else(|_| board.hash())
}

fn has_en_passant_capture(board: &Board) -> bool {
    legal_moves(board).into_iter().any(|mv| {
        board.piece_on(mv.from) == Some(Piece::Pawn)
            && mv.from.file() != mv.to.file()
            && board.piece_on(mv.to).is_none()
    })
}

fn square_shade(sq: Square) -> u8 {
    (sq.file() as u8 + sq.rank() as u8) % 2
}

fn bishops_on_one_colour(bishops: BitBoard) -> bool {
    let mut shades = bishops.into_iter().map(square_shade);
    match shades.next() {
        Some(first) => shades.all(|s| s == first),
        None => true,
    }
}
