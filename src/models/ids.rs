//! Deterministic snapshot fingerprints using SHA256 hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::Player;

/// A deterministic ID derived from the content of a round's input snapshot.
///
/// Two pairing runs over the same players and round carry the same id.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Generate an id from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
    }

    /// Fingerprint a round's players, in the order given.
    pub fn for_round(round: u32, players: &[Player]) -> Self {
        let mut fields = vec![round.to_string()];
        for p in players {
            let opponents: Vec<String> = p.opponents.iter().map(|o| o.to_string()).collect();
            let colours: Vec<&str> = p
                .colour_history
                .iter()
                .map(|c| match c {
                    super::Colour::White => "w",
                    super::Colour::Black => "b",
                })
                .collect();
            fields.push(format!(
                "{}:{}:{}:{}:{}:{}:{}:{:?}",
                p.pairing_number,
                p.score.half_points(),
                p.colour_index,
                opponents.join(","),
                p.bye_count,
                p.active,
                colours.concat(),
                p.last_float,
            ));
        }
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        Self::generate(&refs)
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;

    #[test]
    fn test_generation_deterministic() {
        let id1 = SnapshotId::generate(&["round", "3"]);
        let id2 = SnapshotId::generate(&["round", "3"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_different_inputs() {
        let id1 = SnapshotId::generate(&["round", "3"]);
        let id2 = SnapshotId::generate(&["round", "4"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_length_and_hex() {
        let id = SnapshotId::generate(&["test"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_for_round_tracks_history() {
        let players = vec![Player::new(1), Player::new(2)];
        let same = vec![Player::new(1), Player::new(2)];
        assert_eq!(
            SnapshotId::for_round(1, &players),
            SnapshotId::for_round(1, &same)
        );
        assert_ne!(
            SnapshotId::for_round(1, &players),
            SnapshotId::for_round(2, &players)
        );

        let scored = vec![
            Player::new(1).with_score(Score::from_half_points(2)),
            Player::new(2),
        ];
        assert_ne!(
            SnapshotId::for_round(1, &players),
            SnapshotId::for_round(1, &scored)
        );
    }

    #[test]
    fn test_display_and_debug() {
        let id = SnapshotId::from("abc123");
        assert_eq!(format!("{}", id), "abc123");
        assert!(format!("{:?}", id).contains("abc123"));
    }
}
