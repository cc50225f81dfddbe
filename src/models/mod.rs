//! Core data models for the pairing engine.

mod history;
mod ids;
mod pairing;
mod player;
mod score;
mod vertex;

pub use history::*;
pub use ids::*;
pub use pairing::*;
pub use player::*;
pub use score::*;
pub use vertex::*;
