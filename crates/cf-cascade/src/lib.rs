//! # cf-cascade — Cascading Cluster-Match Engine for ClusterForge
//!
//! Deterministic (given a seed) resolution engine for grid games where
//! connected groups of identical symbols pay, vanish, and make room for new
//! symbols falling from above.
//!
//! ## Features
//!
//! - **Weighted Deal**: Integer weight tables with a scatter soft cap at deal time
//! - **Cluster Detection**: 4-connected components at or above a minimum size
//! - **Persistent Multipliers**: Round-scoped and bonus-scoped cell layers with capped growth
//! - **Gravity Refill**: Stable per-column collapse with fresh draws from the top
//! - **Bonus Mode**: Scatter-triggered free spins with retriggers and deferred settlement
//!
//! ## Architecture
//!
//! ```text
//! GameSession
//!     │
//!     ├── EngineConfig (grid, symbols, weights, payout, growth, awards)
//!     ├── Board::generate ──▶ CascadeResolver
//!     │                          ├── find_clusters
//!     │                          ├── PayTable (pre-growth snapshot)
//!     │                          ├── MultiplierLayer::grow
//!     │                          └── Board::collapse
//!     └── BonusMachine (terminal board scatters)
//!           │
//!           v
//!     SpinResult
//! ```

pub mod board;
pub mod bonus;
pub mod cascade;
pub mod cluster;
pub mod config;
pub mod error;
pub mod multiplier;
pub mod paytable;
pub mod session;
pub mod spin;
pub mod symbols;
pub mod weights;

pub use board::*;
pub use bonus::*;
pub use cascade::*;
pub use cluster::*;
pub use config::*;
pub use error::*;
pub use multiplier::*;
pub use paytable::*;
pub use session::*;
pub use spin::*;
pub use symbols::*;
pub use weights::*;
