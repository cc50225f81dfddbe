//! Round pairing engine.
//!
//! Computes one Swiss round from an immutable player snapshot:
//! - Compatibility graph over the active players (plus the bye vertex)
//! - Tiered edge weights from the quality evaluator
//! - Maximum-cardinality, maximum-weight matching
//! - Colour allocation and board ordering
//!
//! When no perfect matching exists the round comes back as
//! [`RoundOutcome::Infeasible`] with a connectivity diagnosis.

pub mod connectivity;
pub mod graph;
pub mod matching;
pub mod quality;

pub use connectivity::{build_adjacency, find_connected_components, AdjacencyList};
pub use graph::CompatibilityGraph;
pub use matching::{matching_weight, max_weight_matching};
pub use quality::{
    allocate_colours, is_topscorer, ColourAllocation, QualityEvaluator, Weight, BASE_WEIGHT,
};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PairingConfig;
use crate::models::{
    Colour, Component, Game, PairingNumber, Player, RoundPairing, SnapshotId, TournamentSnapshot,
    VertexKey,
};

/// Errors that abort a pairing computation.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Pairing invariant violated: {0}")]
    InvariantViolation(String),
}

/// Why a round could not be fully paired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfeasibilityReport {
    pub round: u32,

    /// Connected components of the compatibility graph, isolated vertices
    /// included as single-vertex components
    pub components: Vec<Component>,

    /// Components with an odd vertex count (the bye vertex counts); each one
    /// alone rules out a perfect matching
    pub odd_components: Vec<Component>,

    /// Players left over by the largest possible matching
    pub unpaired: Vec<PairingNumber>,
}

impl InfeasibilityReport {
    /// One-line human-readable diagnosis.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "Round {} cannot be fully paired: {} player(s) left unpaired",
            self.round,
            self.unpaired.len()
        )];
        for component in &self.odd_components {
            let members: Vec<String> = component.iter().map(|v| v.to_string()).collect();
            let with_bye = if component.iter().any(VertexKey::is_bye) {
                ", bye included"
            } else {
                ""
            };
            parts.push(format!(
                "{} vertices in an isolated group cannot all be paired ({}{})",
                component.len(),
                members.join(" "),
                with_bye
            ));
        }
        parts.join("; ")
    }
}

/// Result of pairing one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundOutcome {
    Paired(RoundPairing),
    Infeasible(InfeasibilityReport),
}

impl RoundOutcome {
    pub fn is_paired(&self) -> bool {
        matches!(self, RoundOutcome::Paired(_))
    }

    pub fn pairing(&self) -> Option<&RoundPairing> {
        match self {
            RoundOutcome::Paired(pairing) => Some(pairing),
            RoundOutcome::Infeasible(_) => None,
        }
    }
}

/// Pairs rounds under a fixed rule configuration.
///
/// Holds no state between calls; one engine may pair any number of rounds
/// or tournaments, from any thread.
#[derive(Debug, Clone, Default)]
pub struct PairingEngine {
    config: PairingConfig,
}

impl PairingEngine {
    pub fn new(config: PairingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    pub fn pair_snapshot(&self, snapshot: &TournamentSnapshot) -> Result<RoundOutcome, PairingError> {
        self.pair_round(&snapshot.players, snapshot.round)
    }

    /// Pair `round` for the given players.
    ///
    /// Withdrawn players are ignored. The input is never modified.
    pub fn pair_round(&self, players: &[Player], round: u32) -> Result<RoundOutcome, PairingError> {
        let graph = CompatibilityGraph::build(players, round, &self.config)?;
        let snapshot_id = SnapshotId::for_round(round, graph.players());

        let evaluator = QualityEvaluator::new(&graph);
        let weighted = evaluator.weighted_edges();
        let partners = max_weight_matching(graph.vertex_count(), &weighted, true)?;

        let matched = partners.iter().filter(|p| p.is_some()).count();
        if matched < graph.vertex_count() {
            let report = diagnose(&graph, &partners)?;
            warn!("{}", report.summary());
            return Ok(RoundOutcome::Infeasible(report));
        }

        debug!(
            "Round {}: matching weight {} over {} edges",
            round,
            matching_weight(&partners, &weighted),
            weighted.len()
        );

        let mut games = Vec::new();
        let mut bye = None;
        for (i, partner) in partners.iter().enumerate() {
            let j = partner.ok_or_else(|| {
                PairingError::InvariantViolation(format!(
                    "vertex {} unmatched in a perfect matching",
                    graph.vertices()[i]
                ))
            })?;
            if j < i {
                continue;
            }
            if partners[j] != Some(i) || !graph.has_edge(i, j) {
                return Err(PairingError::InvariantViolation(format!(
                    "matched pair {} - {} is not a compatibility edge",
                    graph.vertices()[i],
                    graph.vertices()[j]
                )));
            }

            let higher = &graph.players()[i];
            if Some(j) == graph.bye_index() {
                bye = Some(higher.pairing_number);
                continue;
            }

            let lower = &graph.players()[j];
            let (white, black) = match evaluator.colours(i, j).higher {
                Colour::White => (higher.pairing_number, lower.pairing_number),
                Colour::Black => (lower.pairing_number, higher.pairing_number),
            };
            games.push(Game {
                board: games.len() as u32 + 1,
                white,
                black,
            });
        }

        info!(
            "Round {} paired: {} boards{}",
            round,
            games.len(),
            bye.map(|pn| format!(", bye to #{}", pn)).unwrap_or_default()
        );

        Ok(RoundOutcome::Paired(RoundPairing {
            round,
            snapshot_id,
            games,
            bye,
        }))
    }
}

/// Explain a failed round from the graph and its best partial matching.
pub fn diagnose(
    graph: &CompatibilityGraph,
    partners: &[Option<usize>],
) -> Result<InfeasibilityReport, PairingError> {
    let mut components = find_connected_components(&graph.edge_pairs())?;

    let covered: BTreeSet<VertexKey> = components.iter().flatten().copied().collect();
    for &vertex in graph.vertices() {
        if !covered.contains(&vertex) {
            components.push(vec![vertex]);
        }
    }

    let odd_components = components
        .iter()
        .filter(|c| c.len() % 2 == 1)
        .cloned()
        .collect();

    let unpaired = graph
        .vertices()
        .iter()
        .zip(partners)
        .filter(|(_, partner)| partner.is_none())
        .filter_map(|(vertex, _)| vertex.pairing_number())
        .collect();

    Ok(InfeasibilityReport {
        round: graph.round(),
        components,
        odd_components,
        unpaired,
    })
}
