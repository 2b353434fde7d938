//! Perfect-Information Monte Carlo search over UCT for Hearts.
//!
//! One decision flows through four stages: the observed history becomes a
//! [`HeartsState`](hearts_core::model::state::HeartsState) information set
//! ([`protocol`]), the sampler turns it into `W` concrete worlds, each world
//! gets an independent [`uct`] search on the [`pool`], and the [`ensemble`]
//! votes the per-world statistics into a single card.

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod policy;
pub mod pool;
pub mod protocol;
pub mod seeding;
pub mod uct;

pub use config::{AiConfig, DecisionRule};
pub use engine::DecisionEngine;
pub use ensemble::{Decision, PimcEnsemble};
pub use error::EngineError;
pub use pool::{CompletionQueue, WorkerPool};
pub use protocol::{MoveRequest, MoveResponse};
pub use uct::{MoveStats, Uct};
