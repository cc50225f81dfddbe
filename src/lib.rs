//! # Swiss Pairing
//!
//! Swiss-system round pairing by maximum-weight matching.
//!
//! ## Architecture
//!
//! - **models**: Player/history snapshot, graph identifiers, pairing output
//! - **pairing**: Compatibility graph, quality weights, blossom matcher,
//!   connectivity diagnosis, and the round engine tying them together
//! - **storage**: File-backed snapshots and JSONL journals for the CLI
//! - **config**: Configuration loading, validation, and rule constants
//!
//! ```no_run
//! use swiss_pairing::config::PairingConfig;
//! use swiss_pairing::pairing::{PairingEngine, RoundOutcome};
//! use swiss_pairing::Player;
//!
//! let players: Vec<Player> = (1..=6).map(Player::new).collect();
//! let engine = PairingEngine::new(PairingConfig::default());
//! match engine.pair_round(&players, 1)? {
//!     RoundOutcome::Paired(pairing) => println!("{} boards", pairing.games.len()),
//!     RoundOutcome::Infeasible(report) => println!("{}", report.summary()),
//! }
//! # Ok::<(), swiss_pairing::pairing::PairingError>(())
//! ```

pub mod config;
pub mod models;
pub mod pairing;
pub mod storage;

pub use models::*;
