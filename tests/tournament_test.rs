//! Multi-round tournament tests
//!
//! Drives the engine through whole tournaments, feeding every round's
//! results back through the history model, and checks the invariants that
//! must hold after each round.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use swiss_pairing::config::PairingConfig;
use swiss_pairing::models::{
    apply_round, Game, GameResult, Player, RoundPairing, RoundResults, Score, SnapshotId,
};
use swiss_pairing::pairing::{PairingEngine, RoundOutcome};
use swiss_pairing::storage::{FileStore, HistoryConsumer, SnapshotProvider, StorageConfig};

/// Lower pairing number wins; every third board is drawn.
fn results_for(pairing: &RoundPairing) -> RoundResults {
    pairing
        .games
        .iter()
        .map(|g| {
            let result = if g.board % 3 == 0 {
                GameResult::Draw
            } else if g.white < g.black {
                GameResult::WhiteWins
            } else {
                GameResult::BlackWins
            };
            (g.board, result)
        })
        .collect()
}

fn assert_round_valid(players: &[Player], pairing: &RoundPairing) {
    let active: Vec<u32> = players
        .iter()
        .filter(|p| p.active)
        .map(|p| p.pairing_number)
        .collect();
    assert_eq!(pairing.assigned_players(), active, "round {}", pairing.round);

    for game in &pairing.games {
        let white = players
            .iter()
            .find(|p| p.pairing_number == game.white)
            .unwrap();
        assert!(
            !white.opponents.contains(&game.black),
            "round {}: #{} and #{} meet again",
            pairing.round,
            game.white,
            game.black
        );
    }

    if let Some(pn) = pairing.bye {
        let player = players.iter().find(|p| p.pairing_number == pn).unwrap();
        assert_eq!(player.bye_count, 0, "round {}: second bye for #{}", pairing.round, pn);
    }

    let boards: Vec<u32> = pairing.games.iter().map(|g| g.board).collect();
    let expected: Vec<u32> = (1..=pairing.games.len() as u32).collect();
    assert_eq!(boards, expected);
}

/// Only the repeat and bye rules constrain these fields, so while fewer than
/// half the rounds of a round robin are played every round is pairable.
fn open_field_config(rounds: u32) -> PairingConfig {
    let mut config = PairingConfig::default();
    config.total_rounds = Some(rounds);
    config.absolute_colour_rule = false;
    config
}

fn run_tournament(player_count: u32, rounds: u32) -> Vec<Player> {
    let config = open_field_config(rounds);
    let engine = PairingEngine::new(config.clone());

    let mut players: Vec<Player> = (1..=player_count).map(Player::new).collect();
    for round in 1..=rounds {
        let pairing = match engine.pair_round(&players, round).unwrap() {
            RoundOutcome::Paired(pairing) => pairing,
            RoundOutcome::Infeasible(report) => panic!("{}", report.summary()),
        };
        assert_round_valid(&players, &pairing);
        players = apply_round(&players, &pairing, &results_for(&pairing), config.bye_points).unwrap();
    }
    players
}

#[test]
fn test_even_field_five_rounds() {
    let players = run_tournament(12, 5);

    let total: u32 = players.iter().map(|p| p.score.half_points()).sum();
    // every game hands out exactly one point
    assert_eq!(total, 6 * 5 * 2);
    assert!(players.iter().all(|p| p.opponents.len() == 5));
    assert!(players.iter().all(|p| p.bye_count == 0));
}

#[test]
fn test_odd_field_distributes_byes() {
    let players = run_tournament(9, 5);

    let bye_holders = players.iter().filter(|p| p.bye_count == 1).count();
    assert_eq!(bye_holders, 5);
    assert!(players.iter().all(|p| p.bye_count <= 1));
    assert!(players
        .iter()
        .all(|p| p.opponents.len() as u32 + p.bye_count == 5));
}

#[test]
fn test_withdrawn_player_is_not_paired() {
    let config = PairingConfig::default();
    let engine = PairingEngine::new(config.clone());

    let mut players: Vec<Player> = (1..=6).map(Player::new).collect();
    let outcome = engine.pair_round(&players, 1).unwrap();
    let pairing = outcome.pairing().unwrap().clone();
    players = apply_round(&players, &pairing, &results_for(&pairing), config.bye_points).unwrap();

    players[3].active = false;
    let outcome = engine.pair_round(&players, 2).unwrap();
    let pairing = outcome.pairing().unwrap();

    assert!(pairing.game_for(4).is_none());
    assert_eq!(pairing.games.len(), 2);
    assert!(pairing.bye.is_some());
    assert_round_valid(&players, pairing);
}

#[test]
fn test_same_history_same_pairings() {
    assert_eq!(run_tournament(12, 4), run_tournament(12, 4));
}

/// Circle-method round robin: player `n` stays put, the rest rotate.
fn berger_round(n: u32, round: u32) -> RoundPairing {
    let m = n - 1;
    let mut games = Vec::new();
    for i in 0..n / 2 {
        let a = (round + i) % m + 1;
        let b = if i == 0 { n } else { (round + m - i) % m + 1 };
        let (white, black) = if (round + i) % 2 == 0 { (a, b) } else { (b, a) };
        games.push(Game {
            board: i + 1,
            white,
            black,
        });
    }
    RoundPairing {
        round: round + 1,
        snapshot_id: SnapshotId::from("round-robin"),
        games,
        bye: None,
    }
}

#[test]
fn test_round_robin_cross_check() {
    let n = 8;
    let mut players: Vec<Player> = (1..=n).map(Player::new).collect();
    let mut seen = BTreeSet::new();
    let mut total_games = 0;

    for round in 0..n - 1 {
        let pairing = berger_round(n, round);
        for g in &pairing.games {
            let pair = (g.white.min(g.black), g.white.max(g.black));
            assert!(seen.insert(pair), "pair {:?} repeated", pair);
        }
        total_games += pairing.games.len() as u32;
        let results: RoundResults = pairing
            .games
            .iter()
            .map(|g| (g.board, GameResult::Draw))
            .collect();
        players = apply_round(&players, &pairing, &results, Score::ZERO).unwrap();
    }

    assert_eq!(total_games, n / 2 * (n - 1));
    for p in &players {
        assert_eq!(p.opponents.len() as u32, n - 1);
        assert_eq!(p.score, Score::from_half_points(n - 1));
    }

    // Everyone has met everyone: nothing left for a Swiss round to pair
    let outcome = PairingEngine::default().pair_round(&players, n).unwrap();
    let RoundOutcome::Infeasible(report) = outcome else {
        panic!("a completed round robin cannot be paired again");
    };
    assert_eq!(report.components.len(), n as usize);
    assert_eq!(report.unpaired.len(), n as usize);
}

fn play_rounds<S>(store: &mut S, engine: &PairingEngine, rounds: u32)
where
    S: SnapshotProvider + HistoryConsumer,
{
    for round in 1..=rounds {
        let snapshot = store.snapshot(round).unwrap();
        let outcome = engine.pair_snapshot(&snapshot).unwrap();
        let pairing = outcome.pairing().unwrap();
        assert_round_valid(&snapshot.players, pairing);
        store.record_round(pairing, &results_for(pairing)).unwrap();
    }
}

#[test]
fn test_file_store_tournament() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::new(temp_dir.path().to_path_buf());
    let engine = PairingEngine::new(open_field_config(3));

    let mut store = FileStore::open(&config, "club-night", Score::from_half_points(2)).unwrap();
    store.init((1..=7).map(Player::new).collect()).unwrap();
    play_rounds(&mut store, &engine, 3);

    assert_eq!(store.latest_round().unwrap(), Some(4));
    assert_eq!(store.played_rounds().unwrap().len(), 3);

    let final_players = store.snapshot(4).unwrap().players;
    assert_eq!(
        final_players.iter().filter(|p| p.bye_count == 1).count(),
        3
    );
}
