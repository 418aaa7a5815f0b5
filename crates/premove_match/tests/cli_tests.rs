//! End-to-end tests for the `premove-match` binary

use std::path::PathBuf;
use std::process::{Command, Output};

const ENGINE: &str = env!("CARGO_BIN_EXE_random_uci");

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("cli_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn premove_match(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_premove-match"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn test_completed_match_exits_zero() {
    let pgn = scratch("complete.pgn");
    let json = scratch("complete.json");

    let out = premove_match(&[
        "--white-engine",
        ENGINE,
        "--black-engine",
        ENGINE,
        "--white-name",
        "Alpha",
        "--black-arg=--seed=7",
        "--max-plies",
        "30",
        "--premove-movetime",
        "10",
        "--event",
        "CLI test",
        "--output",
        pgn.to_str().unwrap(),
        "--summary-json",
        json.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));

    let text = std::fs::read_to_string(&pgn).unwrap();
    assert!(text.starts_with("[Event \"CLI test\"]"));
    assert!(text.contains("[White \"Alpha\"]"));
    assert!(text.contains("[Black \"RandomUci\"]"));
    assert!(text.contains("1. "));
    assert!(!text.contains("{fallback}"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert!(summary["plies"].as_u64().unwrap() <= 30);
    assert!(summary.get("error").is_none());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Alpha vs RandomUci"));
}

#[test]
fn test_engine_failure_exits_one_with_partial_pgn() {
    let pgn = scratch("abandoned.pgn");

    let out = premove_match(&[
        "--white-engine",
        ENGINE,
        "--black-engine",
        ENGINE,
        "--black-arg=--crash-on-go=3",
        "--output",
        pgn.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));

    let text = std::fs::read_to_string(&pgn).unwrap();
    assert!(text.contains("[Result \"*\"]"));
    assert!(text.contains("[Termination \"abandoned\"]"));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Error:"));
}

#[test]
fn test_missing_engine_is_usage_error() {
    let out = premove_match(&["--white-engine", ENGINE]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_custom_start_and_config_file() {
    let pgn = scratch("from_config.pgn");
    let config = scratch("match.toml");
    std::fs::write(
        &config,
        format!(
            r#"
max_plies = 12
fen = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1"
annotate_fallbacks = true
output = "{}"

[white]
path = "{engine}"
name = "FromFile"

[black]
path = "{engine}"
args = ["--first"]
"#,
            pgn.display(),
            engine = ENGINE
        ),
    )
    .unwrap();

    let out = premove_match(&["--config", config.to_str().unwrap(), "--max-plies", "10"]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));

    let text = std::fs::read_to_string(&pgn).unwrap();
    assert!(text.contains("[White \"FromFile\"]"));
    assert!(text.contains("[SetUp \"1\"]"));
    assert!(text.contains("[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 1\"]"));
    assert!(text.contains("1... "));
}
