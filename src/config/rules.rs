//! Fixed pairing-rule constants.
//!
//! These come from the governing Swiss rules and are not runtime-configurable.

/// Colour index change for a player assigned white.
pub const COLOUR_WHITE_DELTA: i32 = 1;

/// Colour index change for a player assigned black.
pub const COLOUR_BLACK_DELTA: i32 = -1;

/// A player whose score exceeds this fraction of the maximum possible score is a topscorer.
pub const TOPSCORER_THRESHOLD: f64 = 0.5;

/// Scores are exact multiples of this many points.
pub const HALF_POINT: f64 = 0.5;

/// Half points awarded for a win, draw and loss.
pub const WIN_HALF_POINTS: u32 = 2;
pub const DRAW_HALF_POINTS: u32 = 1;
pub const LOSS_HALF_POINTS: u32 = 0;

/// Largest active field the weighting tiers stay exact for.
pub const MAX_PLAYERS: usize = 1024;

/// Largest round number accepted at the model boundary.
pub const MAX_ROUNDS: u32 = 255;

/// A colour index at or beyond this magnitude makes the preference absolute.
pub const ABSOLUTE_COLOUR_IMBALANCE: i32 = 2;
