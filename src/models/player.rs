//! Player/history snapshot model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Score;
use crate::config::rules::{ABSOLUTE_COLOUR_IMBALANCE, COLOUR_BLACK_DELTA, COLOUR_WHITE_DELTA};

/// Stable per-tournament player number. Never reused.
pub type PairingNumber = u32;

/// Piece colour assigned for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colour {
    White,
    Black,
}

impl Colour {
    pub fn opposite(&self) -> Colour {
        match self {
            Colour::White => Colour::Black,
            Colour::Black => Colour::White,
        }
    }

    /// Change applied to a player's colour index.
    pub fn delta(&self) -> i32 {
        match self {
            Colour::White => COLOUR_WHITE_DELTA,
            Colour::Black => COLOUR_BLACK_DELTA,
        }
    }
}

impl std::fmt::Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colour::White => write!(f, "white"),
            Colour::Black => write!(f, "black"),
        }
    }
}

/// Direction a player was moved out of their score group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Float {
    /// Paired against a lower score group (or given the bye)
    Down,
    /// Paired against a higher score group
    Up,
}

/// How strongly a player wants a particular colour next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreferenceStrength {
    Mild,
    Strong,
    Absolute,
}

/// A player's wish for next round's colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourPreference {
    pub colour: Colour,
    pub strength: PreferenceStrength,
}

/// One player's standing and history going into a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable pairing number
    pub pairing_number: PairingNumber,

    /// Current score
    #[serde(default)]
    pub score: Score,

    /// Cumulative whites minus blacks
    #[serde(default)]
    pub colour_index: i32,

    /// Pairing numbers already faced
    #[serde(default)]
    pub opponents: BTreeSet<PairingNumber>,

    /// Pairing-allocated byes received
    #[serde(default)]
    pub bye_count: u32,

    /// False once withdrawn
    #[serde(default = "default_active")]
    pub active: bool,

    /// Colours actually played, oldest first
    #[serde(default)]
    pub colour_history: Vec<Colour>,

    /// Float received in the previous round
    #[serde(default)]
    pub last_float: Option<Float>,
}

fn default_active() -> bool {
    true
}

impl Player {
    /// Create a fresh player with no history.
    pub fn new(pairing_number: PairingNumber) -> Self {
        Self {
            pairing_number,
            score: Score::ZERO,
            colour_index: 0,
            opponents: BTreeSet::new(),
            bye_count: 0,
            active: true,
            colour_history: Vec::new(),
            last_float: None,
        }
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.score = score;
        self
    }

    pub fn with_opponents(mut self, opponents: &[PairingNumber]) -> Self {
        self.opponents.extend(opponents.iter().copied());
        self
    }

    pub fn with_colours(mut self, colours: &[Colour]) -> Self {
        for colour in colours {
            self.colour_index += colour.delta();
            self.colour_history.push(*colour);
        }
        self
    }

    pub fn with_byes(mut self, bye_count: u32) -> Self {
        self.bye_count = bye_count;
        self
    }

    /// Whether the two players have met before, according to either record.
    pub fn has_played(&self, other: &Player) -> bool {
        self.opponents.contains(&other.pairing_number)
            || other.opponents.contains(&self.pairing_number)
    }

    pub fn last_colour(&self) -> Option<Colour> {
        self.colour_history.last().copied()
    }

    /// Colour preference for the coming round, if any.
    pub fn colour_preference(&self) -> Option<ColourPreference> {
        let last_two_equal = match self.colour_history.as_slice() {
            [.., a, b] => a == b,
            _ => false,
        };

        let index_colour = match self.colour_index {
            0 => None,
            i if i > 0 => Some(Colour::Black),
            _ => Some(Colour::White),
        };

        // An imbalance of two outranks a repeated colour that points the other way.
        if let Some(colour) = index_colour {
            if self.colour_index.unsigned_abs() >= ABSOLUTE_COLOUR_IMBALANCE.unsigned_abs() {
                return Some(ColourPreference {
                    colour,
                    strength: PreferenceStrength::Absolute,
                });
            }
        }

        let last = self.last_colour();
        if let Some(last) = last.filter(|_| last_two_equal) {
            return Some(ColourPreference {
                colour: last.opposite(),
                strength: PreferenceStrength::Absolute,
            });
        }

        if let Some(colour) = index_colour {
            return Some(ColourPreference {
                colour,
                strength: PreferenceStrength::Strong,
            });
        }

        last.map(|last| ColourPreference {
            colour: last.opposite(),
            strength: PreferenceStrength::Mild,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_defaults_from_json() {
        let player: Player =
            serde_json::from_str(r#"{"pairing_number": 4, "score": 1.5}"#).unwrap();

        assert_eq!(player.pairing_number, 4);
        assert_eq!(player.score, Score::from_half_points(3));
        assert!(player.active);
        assert!(player.opponents.is_empty());
        assert_eq!(player.last_float, None);
    }

    #[test]
    fn test_has_played_is_symmetric() {
        let a = Player::new(1).with_opponents(&[2]);
        let b = Player::new(2);
        let c = Player::new(3);

        assert!(a.has_played(&b));
        assert!(b.has_played(&a));
        assert!(!a.has_played(&c));
    }

    #[test]
    fn test_colour_preference_from_index() {
        let p = Player::new(1).with_colours(&[Colour::White]);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::Black);
        assert_eq!(pref.strength, PreferenceStrength::Strong);

        let p = Player::new(1).with_colours(&[Colour::Black, Colour::Black]);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::White);
        assert_eq!(pref.strength, PreferenceStrength::Absolute);
    }

    #[test]
    fn test_colour_preference_balanced() {
        let p = Player::new(1);
        assert!(p.colour_preference().is_none());

        let p = Player::new(1).with_colours(&[Colour::White, Colour::Black]);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::White);
        assert_eq!(pref.strength, PreferenceStrength::Mild);
    }

    #[test]
    fn test_colour_preference_same_colour_twice() {
        // index +1, but two whites in a row still forces black
        let p = Player::new(1).with_colours(&[
            Colour::Black,
            Colour::White,
            Colour::White,
        ]);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::Black);
        assert_eq!(pref.strength, PreferenceStrength::Absolute);
    }

    #[test]
    fn test_repeated_colour_overrides_small_index() {
        // index -1 asks for white, but the last two games were white
        let p = Player::new(1).with_colours(&[
            Colour::Black,
            Colour::Black,
            Colour::Black,
            Colour::White,
            Colour::White,
        ]);
        assert_eq!(p.colour_index, -1);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::Black);
        assert_eq!(pref.strength, PreferenceStrength::Absolute);
    }

    #[test]
    fn test_imbalance_of_two_outranks_repeated_colour() {
        let p = Player::new(1).with_colours(&[
            Colour::White,
            Colour::White,
            Colour::White,
            Colour::White,
            Colour::Black,
            Colour::Black,
        ]);
        assert_eq!(p.colour_index, 2);
        let pref = p.colour_preference().unwrap();
        assert_eq!(pref.colour, Colour::Black);
        assert_eq!(pref.strength, PreferenceStrength::Absolute);
    }

    #[test]
    fn test_colour_delta() {
        assert_eq!(Colour::White.delta(), 1);
        assert_eq!(Colour::Black.delta(), -1);
        assert_eq!(Colour::White.opposite(), Colour::Black);
    }
}
