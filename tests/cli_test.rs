//! CLI contract tests
//!
//! Runs the built binary against files in a temporary directory.

use std::path::Path;
use std::process::{Command, Output};

fn swiss_pairing_bin() -> &'static str {
    env!("CARGO_BIN_EXE_swiss-pairing")
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(swiss_pairing_bin())
        .args(["--config", "missing.toml", "--log-level", "warn"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

#[test]
fn test_pair_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("snapshot.json"),
        r#"{"round": 1, "players": [
            {"pairing_number": 1}, {"pairing_number": 2},
            {"pairing_number": 3}, {"pairing_number": 4},
            {"pairing_number": 5}
        ]}"#,
    )
    .unwrap();

    let output = run(
        dir.path(),
        &["pair", "--snapshot", "snapshot.json", "--output", "out.jsonl"],
    );
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Board   1"));
    assert!(stdout.contains("Bye:       #5"));

    let journal = std::fs::read_to_string(dir.path().join("out.jsonl")).unwrap();
    assert_eq!(journal.lines().count(), 1);
    assert!(journal.contains("\"bye\":5"));
}

#[test]
fn test_pair_json_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("snapshot.json"),
        r#"{"round": 1, "players": [{"pairing_number": 1}, {"pairing_number": 2}]}"#,
    )
    .unwrap();

    let output = run(dir.path(), &["pair", "--snapshot", "snapshot.json", "--json"]);
    assert!(output.status.success(), "{:?}", output);

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcome"], "paired");
    assert_eq!(value["games"][0]["white"], 1);
}

#[test]
fn test_pair_rejects_bad_score() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("snapshot.json"),
        r#"{"round": 2, "players": [{"pairing_number": 1, "score": 0.3}]}"#,
    )
    .unwrap();

    let output = run(dir.path(), &["pair", "--snapshot", "snapshot.json"]);
    assert!(!output.status.success());
}

#[test]
fn test_components_command() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("edges.json"),
        r#"[
            [{"player": 1}, {"player": 2}], [{"player": 2}, {"player": 3}],
            [{"player": 1}, {"player": 3}], [{"player": 4}, {"player": 5}],
            [{"player": 5}, {"player": 6}], [{"player": 4}, {"player": 6}]
        ]"#,
    )
    .unwrap();

    let output = run(dir.path(), &["components", "--edges", "edges.json"]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 component(s)"));
    assert!(stdout.contains("#1 #2 #3"));
    assert!(stdout.contains("#4 #5 #6"));
}

#[test]
fn test_simulate_persists_tournament() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(
        dir.path(),
        &[
            "--data-dir",
            "data",
            "simulate",
            "--players",
            "6",
            "--rounds",
            "3",
            "--tournament",
            "demo",
        ],
    );
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Round 3"));
    assert!(stdout.contains("Standings"));

    let base = dir.path().join("data/tournaments/demo");
    assert!(base.join("snapshots/round-004.json").exists());
    let rounds = std::fs::read_to_string(base.join("rounds.jsonl")).unwrap();
    assert_eq!(rounds.lines().count(), 3);
}
