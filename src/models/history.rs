//! Feeding a played round back into the player/history model.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{Colour, Float, GameResult, Player, RoundPairing, Score};
use crate::config::rules::{DRAW_HALF_POINTS, LOSS_HALF_POINTS, WIN_HALF_POINTS};

/// Errors when applying results to a snapshot.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No result recorded for board {0}")]
    MissingResult(u32),

    #[error("Pairing references unknown player {0}")]
    UnknownPlayer(u32),
}

/// Results keyed by board number.
pub type RoundResults = BTreeMap<u32, GameResult>;

/// Build the next round's snapshot from this round's pairing and results.
///
/// Players absent from the pairing (withdrawn) are carried over unchanged
/// apart from clearing their float.
pub fn apply_round(
    players: &[Player],
    pairing: &RoundPairing,
    results: &RoundResults,
    bye_points: Score,
) -> Result<Vec<Player>, HistoryError> {
    let index: BTreeMap<u32, usize> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.pairing_number, i))
        .collect();
    let lookup = |pn: u32| index.get(&pn).copied().ok_or(HistoryError::UnknownPlayer(pn));

    let mut next: Vec<Player> = players.to_vec();
    for player in &mut next {
        player.last_float = None;
    }

    for game in &pairing.games {
        let result = results
            .get(&game.board)
            .copied()
            .ok_or(HistoryError::MissingResult(game.board))?;
        let w = lookup(game.white)?;
        let b = lookup(game.black)?;

        let (white_half, black_half) = match result {
            GameResult::WhiteWins => (WIN_HALF_POINTS, LOSS_HALF_POINTS),
            GameResult::Draw => (DRAW_HALF_POINTS, DRAW_HALF_POINTS),
            GameResult::BlackWins => (LOSS_HALF_POINTS, WIN_HALF_POINTS),
        };

        let (white_before, black_before) = (players[w].score, players[b].score);
        let (white_float, black_float) = if white_before > black_before {
            (Some(Float::Down), Some(Float::Up))
        } else if white_before < black_before {
            (Some(Float::Up), Some(Float::Down))
        } else {
            (None, None)
        };

        record_game(&mut next[w], game.black, Colour::White, white_half, white_float);
        record_game(&mut next[b], game.white, Colour::Black, black_half, black_float);
    }

    if let Some(pn) = pairing.bye {
        let i = lookup(pn)?;
        let player = &mut next[i];
        player.score = player.score + bye_points;
        player.bye_count += 1;
        player.last_float = Some(Float::Down);
    }

    Ok(next)
}

fn record_game(
    player: &mut Player,
    opponent: u32,
    colour: Colour,
    half_points: u32,
    float: Option<Float>,
) {
    player.score = player.score + Score::from_half_points(half_points);
    player.colour_index += colour.delta();
    player.colour_history.push(colour);
    player.opponents.insert(opponent);
    player.last_float = float;
}
