use super::*;
use crate::error::ProviderError;
use chess_core::{legal_moves, parse_uci_move, Board};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

enum Reply {
    Move(&'static str),
    NoMove,
    Fail,
}

#[derive(Clone, Debug)]
struct Logged {
    purpose: QueryPurpose,
    budget: SearchBudget,
    board: Board,
}

/// Answers from a script, then with the first legal move once it runs dry.
struct Scripted {
    name: &'static str,
    replies: VecDeque<Reply>,
    log: Rc<RefCell<Vec<Logged>>>,
    shutdowns: Rc<Cell<u32>>,
}

impl Scripted {
    fn new(name: &'static str, replies: Vec<Reply>) -> Self {
        Self {
            name,
            replies: replies.into(),
            log: Rc::new(RefCell::new(Vec::new())),
            shutdowns: Rc::new(Cell::new(0)),
        }
    }

    fn first_legal(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }
}

impl MoveProvider for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn propose(&mut self, query: &MoveQuery) -> Result<Option<Move>, ProviderError> {
        self.log.borrow_mut().push(Logged {
            purpose: query.purpose,
            budget: query.budget,
            board: query.board.clone(),
        });
        match self.replies.pop_front() {
            Some(Reply::Move(txt)) => Ok(parse_uci_move(&query.board, txt).unwrap()),
            Some(Reply::NoMove) => Ok(None),
            Some(Reply::Fail) => Err(ProviderError::Exited {
                name: self.name.to_string(),
            }),
            None => Ok(legal_moves(&query.board).first().copied()),
        }
    }

    fn shutdown(&mut self) {
        self.shutdowns.set(self.shutdowns.get() + 1);
    }
}

fn config(max_plies: u32) -> MatchConfig {
    MatchConfig {
        premove_budget: SearchBudget::depth(6),
        fallback_budget: SearchBudget::depth(1),
        max_plies,
        ..Default::default()
    }
}

fn placement(board: &Board) -> String {
    board.to_string().split_whitespace().next().unwrap().to_string()
}

fn ucis(record: &GameRecord) -> Vec<&str> {
    record.moves.iter().map(|m| m.uci.as_str()).collect()
}

#[test]
fn test_premove_slots_overwrite_and_clear() {
    let board = Board::default();
    let a = parse_uci_move(&board, "e2e4").unwrap();
    let b = parse_uci_move(&board, "d2d4").unwrap();

    let mut slots = PremoveSlots::default();
    slots.commit(Color::White, a);
    slots.commit(Color::White, b);
    assert_eq!(slots.get(Color::White), b);
    assert_eq!(slots.get(Color::Black), None);

    assert_eq!(slots.take(Color::White), b);
    assert_eq!(slots.get(Color::White), None);
}

#[test]
fn test_all_premoves_legal_record_matches_applied_moves() {
    let white = Scripted::new("A", vec![Reply::Move("e2e4"), Reply::Move("g1f3")]);
    let black = Scripted::new("B", vec![Reply::Move("e7e5"), Reply::Move("b8c6")]);
    let white_log = white.log.clone();

    let game = PremoveMatch::new(config(4), Box::new(white), Box::new(black)).unwrap();
    let record = game.run().unwrap();

    assert_eq!(ucis(&record), vec!["e2e4", "e7e5", "g1f3", "b8c6"]);
    assert!(record.moves.iter().all(|m| m.source == MoveSource::Premove));
    assert_eq!(record.white, "A");
    assert_eq!(record.black, "B");
    assert!(white_log
        .borrow()
        .iter()
        .all(|q| q.purpose == QueryPurpose::Premove && q.budget == SearchBudget::Depth(6)));
    assert!(record.to_pgn(false).contains("1. e4 e5 2. Nf3 Nc6 *"));
}

#[test]
fn test_illegal_premove_takes_fallback_and_clears_slot() {
    // White's second premove e4e5 is blocked once Black plays e7e5
    let white = Scripted::new(
        "A",
        vec![Reply::Move("e2e4"), Reply::Move("e4e5"), Reply::Move("g1f3")],
    );
    let black = Scripted::new("B", vec![Reply::Move("e7e5"), Reply::Move("b8c6")]);
    let white_log = white.log.clone();

    let mut game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    while game.position().plies_played() < 3 {
        game.step().unwrap();
    }

    assert_eq!(game.state(), MatchState::CheckTermination);
    assert_eq!(game.committed(Color::White), None);
    let b8c6 = parse_uci_move(game.position().board(), "b8c6").unwrap();
    assert_eq!(game.committed(Color::Black), b8c6);

    let record = game.record();
    assert_eq!(ucis(record), vec!["e2e4", "e7e5", "g1f3"]);
    assert_eq!(record.moves[2].source, MoveSource::Fallback);
    assert_eq!(record.fallback_count(Color::White), 1);

    let log = white_log.borrow();
    assert_eq!(log.len(), 3);
    assert_eq!(log[2].purpose, QueryPurpose::Fallback);
    assert_eq!(log[2].budget, SearchBudget::Depth(1));
}

#[test]
fn test_premove_requested_before_opponent_move_is_applied() {
    let white = Scripted::new("A", vec![Reply::Move("e2e4"), Reply::Move("g1f3")]);
    let black = Scripted::new("B", vec![Reply::Move("e7e5")]);
    let (white_log, black_log) = (white.log.clone(), black.log.clone());

    let game = PremoveMatch::new(config(3), Box::new(white), Box::new(black)).unwrap();
    game.run().unwrap();

    let start = Board::default();
    let mut after_e4 = start.clone();
    after_e4.play(parse_uci_move(&start, "e2e4").unwrap().unwrap());

    let white_log = white_log.borrow();
    let black_log = black_log.borrow();

    // Black commits while White's first move is still pending
    assert_eq!(placement(&black_log[0].board), placement(&start));
    assert_eq!(black_log[0].board.side_to_move(), Color::Black);

    // White's second premove sees 1.e4 but not Black's reply
    assert_eq!(placement(&white_log[1].board), placement(&after_e4));
    assert_eq!(white_log[1].board.side_to_move(), Color::White);
}

#[test]
fn test_checkmate_terminates_with_decisive_result() {
    let white = Scripted::new(
        "A",
        vec![Reply::Move("f2f3"), Reply::Move("g2g4"), Reply::Move("a2a3")],
    );
    let black = Scripted::new("B", vec![Reply::Move("e7e5"), Reply::Move("d8h4")]);
    let white_log = white.log.clone();

    let game = PremoveMatch::new(config(50), Box::new(white), Box::new(black)).unwrap();
    let record = game.run().unwrap();

    assert_eq!(record.outcome, Outcome::BlackWins);
    assert_eq!(record.termination, Some(Termination::Checkmate));
    assert_eq!(record.ply_count(), 4);
    // Nothing is asked once the game is over
    assert_eq!(white_log.borrow().len(), 3);

    let pgn = record.to_pgn(false);
    assert!(pgn.contains("[Result \"0-1\"]"));
    assert!(pgn.contains("Qh4# 0-1"));
}

#[test]
fn test_ply_limit_is_undetermined() {
    let white = Scripted::first_legal("A");
    let black = Scripted::first_legal("B");

    let game = PremoveMatch::new(config(6), Box::new(white), Box::new(black)).unwrap();
    let record = game.run().unwrap();

    assert_eq!(record.ply_count(), 6);
    assert_eq!(record.outcome, Outcome::Undetermined);
    assert_eq!(record.termination, Some(Termination::PlyLimit));
    assert!(record.to_pgn(false).contains("[Result \"*\"]"));
}

#[test]
fn test_every_applied_move_is_legal_over_a_long_game() {
    let white = Scripted::first_legal("A");
    let black = Scripted::first_legal("B");

    let game = PremoveMatch::new(config(120), Box::new(white), Box::new(black)).unwrap();
    let record = game.run().unwrap();

    let mut replay = Position::startpos();
    for m in &record.moves {
        let mv = parse_uci_move(replay.board(), &m.uci).unwrap().unwrap();
        assert!(replay.is_legal(mv), "{} illegal at {}", m.uci, replay.fen());
        replay.play(mv).unwrap();
    }
    assert!(record.termination.is_some());
}

#[test]
fn test_failed_fallback_aborts_without_fabricating_a_move() {
    let white = Scripted::new(
        "A",
        vec![Reply::Move("e2e4"), Reply::Move("e4e5"), Reply::Fail],
    );
    let black = Scripted::new("B", vec![Reply::Move("e7e5"), Reply::Move("b8c6")]);
    let (white_down, black_down) = (white.shutdowns.clone(), black.shutdowns.clone());

    let game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    let abort = game.run().unwrap_err();

    assert!(matches!(
        abort.error,
        MatchError::Provider { side: "white", .. }
    ));
    assert_eq!(ucis(&abort.record), vec!["e2e4", "e7e5"]);
    assert_eq!(abort.record.outcome, Outcome::Undetermined);
    assert_eq!(abort.record.termination, Some(Termination::Abandoned));
    assert_eq!(white_down.get(), 1);
    assert_eq!(black_down.get(), 1);
}

#[test]
fn test_missing_fallback_move_is_fatal() {
    let white = Scripted::new(
        "A",
        vec![Reply::Move("e2e4"), Reply::Move("e4e5"), Reply::NoMove],
    );
    let black = Scripted::new("B", vec![Reply::Move("e7e5")]);

    let game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    let abort = game.run().unwrap_err();
    assert!(matches!(abort.error, MatchError::FallbackUnavailable { .. }));
}

#[test]
fn test_illegal_fallback_move_is_fatal() {
    let white = Scripted::new(
        "A",
        vec![Reply::Move("e2e4"), Reply::Move("e4e5"), Reply::Move("e4e5")],
    );
    let black = Scripted::new("B", vec![Reply::Move("e7e5")]);

    let game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    let abort = game.run().unwrap_err();
    assert!(matches!(abort.error, MatchError::IllegalFallback { .. }));
    assert_eq!(abort.record.ply_count(), 2);
}

#[test]
fn test_premove_request_failure_is_fatal() {
    let white = Scripted::new("A", vec![Reply::Fail]);
    let black = Scripted::first_legal("B");

    let game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    let abort = game.run().unwrap_err();
    assert!(matches!(abort.error, MatchError::Provider { .. }));
    assert_eq!(abort.record.ply_count(), 0);
}

#[test]
fn test_no_premove_offered_uses_fallback() {
    let white = Scripted::new("A", vec![Reply::NoMove, Reply::Move("d2d4")]);
    let black = Scripted::new("B", vec![Reply::Move("d7d5")]);
    let white_log = white.log.clone();

    let mut game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    while game.position().plies_played() < 1 {
        game.step().unwrap();
    }

    assert_eq!(game.record().moves[0].uci, "d2d4");
    assert_eq!(game.record().moves[0].source, MoveSource::Fallback);
    assert_eq!(white_log.borrow()[1].purpose, QueryPurpose::Fallback);
}

#[test]
fn test_terminal_start_position_asks_nobody() {
    let white = Scripted::first_legal("A");
    let black = Scripted::first_legal("B");
    let white_log = white.log.clone();

    let cfg = MatchConfig {
        start_fen: Some("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".to_string()),
        ..config(10)
    };
    let game = PremoveMatch::new(cfg, Box::new(white), Box::new(black)).unwrap();
    let record = game.run().unwrap();

    assert_eq!(record.termination, Some(Termination::Stalemate));
    assert_eq!(record.outcome, Outcome::Draw);
    assert!(white_log.borrow().is_empty());
}

#[test]
fn test_invalid_start_fen_releases_providers() {
    let white = Scripted::first_legal("A");
    let black = Scripted::first_legal("B");
    let (white_down, black_down) = (white.shutdowns.clone(), black.shutdowns.clone());

    let cfg = MatchConfig {
        start_fen: Some("not a fen".to_string()),
        ..config(10)
    };
    assert!(PremoveMatch::new(cfg, Box::new(white), Box::new(black)).is_err());
    assert_eq!(white_down.get(), 1);
    assert_eq!(black_down.get(), 1);
}

#[test]
fn test_dropping_unfinished_match_releases_providers() {
    let white = Scripted::first_legal("A");
    let black = Scripted::first_legal("B");
    let white_down = white.shutdowns.clone();

    let mut game = PremoveMatch::new(config(10), Box::new(white), Box::new(black)).unwrap();
    game.step().unwrap();
    drop(game);
    assert_eq!(white_down.get(), 1);
}
