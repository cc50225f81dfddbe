//! Pairing output model: the games of one round and their results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Colour, PairingNumber, Player, SnapshotId, VertexKey};

/// A single board: two players with colours assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Board number, 1-based, in ranking order of the higher-ranked player
    pub board: u32,

    /// Player with the white pieces
    pub white: PairingNumber,

    /// Player with the black pieces
    pub black: PairingNumber,
}

impl Game {
    pub fn involves(&self, pn: PairingNumber) -> bool {
        self.white == pn || self.black == pn
    }

    /// Colour played by `pn`, if they sit at this board.
    pub fn colour_of(&self, pn: PairingNumber) -> Option<Colour> {
        if self.white == pn {
            Some(Colour::White)
        } else if self.black == pn {
            Some(Colour::Black)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, pn: PairingNumber) -> Option<PairingNumber> {
        if self.white == pn {
            Some(self.black)
        } else if self.black == pn {
            Some(self.white)
        } else {
            None
        }
    }
}

/// Symmetric partner map over graph vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    partners: BTreeMap<VertexKey, VertexKey>,
}

impl Matching {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `a` and `b` as partners of each other.
    pub fn insert(&mut self, a: VertexKey, b: VertexKey) {
        self.partners.insert(a, b);
        self.partners.insert(b, a);
    }

    pub fn partner(&self, key: VertexKey) -> Option<VertexKey> {
        self.partners.get(&key).copied()
    }

    /// Number of matched vertices.
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// Each pair once, lower key first.
    pub fn pairs(&self) -> impl Iterator<Item = (VertexKey, VertexKey)> + '_ {
        self.partners
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (*a, *b))
    }
}

/// The complete pairing of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPairing {
    /// Round number
    pub round: u32,

    /// Fingerprint of the snapshot this pairing was computed from
    pub snapshot_id: SnapshotId,

    /// Boards in order
    pub games: Vec<Game>,

    /// Player receiving the pairing-allocated bye, if the field is odd
    pub bye: Option<PairingNumber>,
}

impl RoundPairing {
    /// Find the board a player sits at.
    pub fn game_for(&self, pn: PairingNumber) -> Option<&Game> {
        self.games.iter().find(|g| g.involves(pn))
    }

    /// Every player assigned this round, bye included.
    pub fn assigned_players(&self) -> Vec<PairingNumber> {
        let mut assigned: Vec<PairingNumber> = self
            .games
            .iter()
            .flat_map(|g| [g.white, g.black])
            .chain(self.bye)
            .collect();
        assigned.sort_unstable();
        assigned
    }

    /// The pairing as a vertex matching, bye included.
    pub fn matching(&self) -> Matching {
        let mut matching = Matching::new();
        for game in &self.games {
            matching.insert(VertexKey::Player(game.white), VertexKey::Player(game.black));
        }
        if let Some(pn) = self.bye {
            matching.insert(VertexKey::Player(pn), VertexKey::Bye);
        }
        matching
    }
}

/// Result of a played board from white's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWins,
    Draw,
    BlackWins,
}

/// Input to a round's pairing computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    /// Round about to be paired
    pub round: u32,

    /// Every registered player, withdrawn ones included
    pub players: Vec<Player>,
}
