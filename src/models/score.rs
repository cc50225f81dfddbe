//! Exact tournament scores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::config::rules::HALF_POINT;

/// A tournament score, stored exactly as a count of half points.
///
/// Serialized as a decimal number of points (`2.5`); deserialization rejects
/// negative values and anything that is not a multiple of half a point.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(u32);

impl Score {
    pub const ZERO: Score = Score(0);

    /// Create a score from a count of half points.
    pub fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    /// The score as a count of half points.
    pub fn half_points(&self) -> u32 {
        self.0
    }

    /// The score in points.
    pub fn points(&self) -> f64 {
        self.0 as f64 * HALF_POINT
    }

    /// Absolute difference in half points.
    pub fn abs_diff(&self, other: Score) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl Add for Score {
    type Output = Score;

    fn add(self, rhs: Score) -> Score {
        Score(self.0 + rhs.0)
    }
}

impl TryFrom<f64> for Score {
    type Error = String;

    fn try_from(points: f64) -> Result<Self, Self::Error> {
        if !points.is_finite() || points < 0.0 {
            return Err(format!("score must be a non-negative number, got {}", points));
        }
        let halves = points / HALF_POINT;
        if halves.fract() != 0.0 {
            return Err(format!(
                "score must be a multiple of {}, got {}",
                HALF_POINT, points
            ));
        }
        if halves > u32::MAX as f64 {
            return Err(format!("score out of range: {}", points));
        }
        Ok(Score(halves as u32))
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> f64 {
        score.points()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}
