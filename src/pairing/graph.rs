//! Compatibility graph construction.
//!
//! Vertices are the active players in ranking order (score descending, then
//! pairing number ascending), followed by the bye vertex when the active
//! count is odd. An edge joins two vertices only when the pairing is legal.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::rules::{MAX_PLAYERS, MAX_ROUNDS, WIN_HALF_POINTS};
use crate::config::PairingConfig;
use crate::models::{EdgePair, Player, PreferenceStrength, VertexKey};

use super::quality::is_topscorer;
use super::PairingError;

/// Legal candidate pairings for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityGraph {
    round: u32,
    players: Vec<Player>,
    vertices: Vec<VertexKey>,
    edges: Vec<(usize, usize)>,
}

impl CompatibilityGraph {
    /// Build the graph for `round` from a player snapshot.
    ///
    /// Withdrawn players are left out. Illegal pairings are dropped silently;
    /// malformed snapshots are rejected.
    pub fn build(
        players: &[Player],
        round: u32,
        config: &PairingConfig,
    ) -> Result<Self, PairingError> {
        validate_snapshot(players, round)?;

        let mut ranked: Vec<Player> = players.iter().filter(|p| p.active).cloned().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.pairing_number.cmp(&b.pairing_number))
        });

        let mut vertices: Vec<VertexKey> = ranked
            .iter()
            .map(|p| VertexKey::Player(p.pairing_number))
            .collect();
        let bye = if ranked.len() % 2 == 1 {
            vertices.push(VertexKey::Bye);
            Some(ranked.len())
        } else {
            None
        };

        let final_round = config.is_final_round(round);
        let mut edges = Vec::new();
        let mut excluded = 0usize;

        for i in 0..ranked.len() {
            for j in (i + 1)..ranked.len() {
                if is_legal_pair(&ranked[i], &ranked[j], round, final_round, config) {
                    edges.push((i, j));
                } else {
                    excluded += 1;
                }
            }
            if let Some(b) = bye {
                if ranked[i].bye_count < config.max_byes {
                    edges.push((i, b));
                } else {
                    excluded += 1;
                }
            }
        }
        // Bye edges were interleaved per row; keep the list in (i, j) order
        edges.sort_unstable();

        debug!(
            "Round {}: {} vertices, {} edges, {} candidate pairings excluded",
            round,
            vertices.len(),
            edges.len(),
            excluded
        );

        Ok(Self {
            round,
            players: ranked,
            vertices,
            edges,
        })
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Active players in ranking order; index `i` is vertex `i`.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn vertices(&self) -> &[VertexKey] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Index of the bye vertex, present iff the active count is odd.
    pub fn bye_index(&self) -> Option<usize> {
        if self.vertices.last() == Some(&VertexKey::Bye) {
            Some(self.vertices.len() - 1)
        } else {
            None
        }
    }

    /// Edges as vertex indices, `i < j`, in ascending order.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn edge_pairs(&self) -> Vec<EdgePair> {
        self.edges
            .iter()
            .map(|&(i, j)| EdgePair::new(self.vertices[i], self.vertices[j]))
            .collect()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.binary_search(&key).is_ok()
    }
}

/// Reject snapshots the engine cannot pair meaningfully.
fn validate_snapshot(players: &[Player], round: u32) -> Result<(), PairingError> {
    if round == 0 || round > MAX_ROUNDS {
        return Err(PairingError::InvalidSnapshot(format!(
            "round must be between 1 and {}, got {}",
            MAX_ROUNDS, round
        )));
    }

    let mut seen = BTreeSet::new();
    for p in players {
        if !seen.insert(p.pairing_number) {
            return Err(PairingError::InvalidSnapshot(format!(
                "duplicate pairing number {}",
                p.pairing_number
            )));
        }
        if p.score.half_points() > MAX_ROUNDS * WIN_HALF_POINTS {
            return Err(PairingError::InvalidSnapshot(format!(
                "player {} has an impossible score {}",
                p.pairing_number, p.score
            )));
        }
        if p.colour_index.unsigned_abs() > MAX_ROUNDS {
            return Err(PairingError::InvalidSnapshot(format!(
                "player {} has an impossible colour index {}",
                p.pairing_number, p.colour_index
            )));
        }
    }

    let active = players.iter().filter(|p| p.active).count();
    if active > MAX_PLAYERS {
        return Err(PairingError::InvalidSnapshot(format!(
            "{} active players exceeds the supported maximum of {}",
            active, MAX_PLAYERS
        )));
    }

    Ok(())
}

/// Hard constraints between two players.
fn is_legal_pair(
    a: &Player,
    b: &Player,
    round: u32,
    final_round: bool,
    config: &PairingConfig,
) -> bool {
    if a.has_played(b) {
        return false;
    }

    if config.absolute_colour_rule {
        if let (Some(pa), Some(pb)) = (a.colour_preference(), b.colour_preference()) {
            let clash = pa.strength == PreferenceStrength::Absolute
                && pb.strength == PreferenceStrength::Absolute
                && pa.colour == pb.colour;
            let relaxed = final_round && (is_topscorer(a, round) || is_topscorer(b, round));
            if clash && !relaxed {
                return false;
            }
        }
    }

    true
}
