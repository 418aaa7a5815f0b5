//! Random move UCI engine
//!
//! Plays a random (or the first) legal move at any budget. Used to exercise
//! the match runner end to end; the failure switches let tests simulate a
//! crashing, babbling or hanging engine on a chosen `go`.

use chess_core::{legal_moves, move_to_uci, parse_uci_move, Position};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "random_uci", about = "UCI engine that plays random legal moves")]
struct Args {
    /// Name reported in `id name`
    #[arg(long, default_value = "RandomUci")]
    name: String,

    /// Random seed
    #[arg(long, default_value_t = 1u64)]
    seed: u64,

    /// Always play the first legal move instead of a random one
    #[arg(long)]
    first: bool,

    /// Exit without answering on the Nth `go` (1-based)
    #[arg(long)]
    crash_on_go: Option<u32>,

    /// Answer the Nth `go` with an unparsable move
    #[arg(long)]
    garbage_on_go: Option<u32>,

    /// Never answer the Nth `go`
    #[arg(long)]
    hang_on_go: Option<u32>,

    /// Think this long before every `bestmove`
    #[arg(long, default_value_t = 0u64)]
    think_ms: u64,

    /// While thinking, print an `info` line this often (silent if unset)
    #[arg(long)]
    info_every_ms: Option<u64>,
}

/// Sleep for `think_ms`, optionally reporting progress while doing so.
fn think(out: &mut impl Write, think_ms: u64, info_every_ms: Option<u64>) {
    let step = info_every_ms.unwrap_or(think_ms).max(1);
    let mut elapsed = 0;
    let mut depth = 1;
    while elapsed < think_ms {
        let nap = step.min(think_ms - elapsed);
        std::thread::sleep(Duration::from_millis(nap));
        elapsed += nap;
        if info_every_ms.is_some() {
            writeln!(out, "info depth {} time {}", depth, elapsed).ok();
            out.flush().ok();
            depth += 1;
        }
    }
}

/// Apply `position startpos|fen <fen> [moves ...]`. Unknown moves stop the replay.
fn set_position(args: &[&str]) -> Option<Position> {
    let (mut pos, rest) = match args.first() {
        Some(&"startpos") => (Position::startpos(), &args[1..]),
        Some(&"fen") => {
            let end = args.iter().position(|&a| a == "moves").unwrap_or(args.len());
            let fen = args[1..end].join(" ");
            (Position::from_fen(&fen).ok()?, &args[end..])
        }
        _ => return None,
    };
    if rest.first() == Some(&"moves") {
        for txt in &rest[1..] {
            let mv = parse_uci_move(pos.board(), txt).ok().flatten()?;
            pos.play(mv).ok()?;
        }
    }
    Some(pos)
}

fn main() {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut pos = Position::startpos();
    let mut go_count = 0u32;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "uci" => {
                writeln!(stdout, "id name {}", args.name).ok();
                writeln!(stdout, "id author premove_match").ok();
                writeln!(stdout, "option name Hash type spin default 16 min 1 max 1024").ok();
                writeln!(stdout, "uciok").ok();
            }
            "isready" => {
                writeln!(stdout, "readyok").ok();
            }
            "ucinewgame" => {
                pos = Position::startpos();
            }
            "position" => {
                pos = set_position(&parts[1..]).unwrap_or_default();
            }
            "go" => {
                go_count += 1;
                if args.crash_on_go == Some(go_count) {
                    std::process::exit(3);
                }
                if args.hang_on_go == Some(go_count) {
                    continue;
                }
                think(&mut stdout, args.think_ms, args.info_every_ms);
                if args.garbage_on_go == Some(go_count) {
                    writeln!(stdout, "bestmove zz99").ok();
                } else {
                    let moves = legal_moves(pos.board());
                    let pick = if args.first {
                        moves.first()
                    } else {
                        moves.choose(&mut rng)
                    };
                    match pick {
                        Some(&mv) => {
                            writeln!(stdout, "info depth 1 score cp 0").ok();
                            writeln!(stdout, "bestmove {}", move_to_uci(pos.board(), mv)).ok();
                        }
                        None => {
                            writeln!(stdout, "bestmove (none)").ok();
                        }
                    }
                }
            }
            "quit" => break,
            _ => {
                // ignore setoption, stop and anything unknown
            }
        }
        stdout.flush().ok();
    }
}
