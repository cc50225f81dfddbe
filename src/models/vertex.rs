//! Graph vertex and edge identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PairingNumber;

/// A vertex in a round's pairing graph: a player, or the single bye vertex.
///
/// Orders players by pairing number, with the bye after every player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexKey {
    Player(PairingNumber),
    Bye,
}

impl VertexKey {
    pub fn pairing_number(&self) -> Option<PairingNumber> {
        match self {
            VertexKey::Player(pn) => Some(*pn),
            VertexKey::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, VertexKey::Bye)
    }
}

impl From<PairingNumber> for VertexKey {
    fn from(pn: PairingNumber) -> Self {
        VertexKey::Player(pn)
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKey::Player(pn) => write!(f, "#{}", pn),
            VertexKey::Bye => write!(f, "BYE"),
        }
    }
}

/// An unordered pair of vertices, stored with the smaller key first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(VertexKey, VertexKey)", into = "(VertexKey, VertexKey)")]
pub struct EdgePair {
    low: VertexKey,
    high: VertexKey,
}

impl EdgePair {
    pub fn new(a: VertexKey, b: VertexKey) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Edge between two players.
    pub fn players(a: PairingNumber, b: PairingNumber) -> Self {
        Self::new(VertexKey::Player(a), VertexKey::Player(b))
    }

    /// Edge between a player and the bye vertex.
    pub fn bye(pn: PairingNumber) -> Self {
        Self::new(VertexKey::Player(pn), VertexKey::Bye)
    }

    pub fn endpoints(&self) -> (VertexKey, VertexKey) {
        (self.low, self.high)
    }
}

impl From<(VertexKey, VertexKey)> for EdgePair {
    fn from((a, b): (VertexKey, VertexKey)) -> Self {
        EdgePair::new(a, b)
    }
}

impl From<EdgePair> for (VertexKey, VertexKey) {
    fn from(edge: EdgePair) -> Self {
        edge.endpoints()
    }
}

impl fmt::Display for EdgePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Vertices reachable from one another, in discovery order.
pub type Component = Vec<VertexKey>;
