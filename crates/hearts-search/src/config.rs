use crate::error::EngineError;
use serde::{Deserialize, Serialize};

const DEFAULT_SIMULATIONS: u32 = 10_000;
const DEFAULT_WORLDS: u32 = 30;
const DEFAULT_EPSILON: f64 = 0.1;
const DEFAULT_EXPLORATION: f64 = 0.4;
const DEFAULT_MAX_DEAL_ATTEMPTS: usize = 1000;
const DEFAULT_VARIANCE_PENALTY: f64 = 0.5;

/// Search configuration carried in a request's `ai_config` block. Every
/// field has a default so an empty block (or none at all) works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Total simulation budget across all worlds.
    pub simulations: u32,
    /// Number of sampled worlds to search.
    pub worlds: u32,
    /// Random-move probability inside playouts.
    pub epsilon: f64,
    /// Fan worlds across the worker pool.
    pub use_threads: bool,
    /// UCB1 exploration constant.
    pub exploration: f64,
    pub decision_rule: DecisionRule,
    /// Standard-deviation penalty used by [`DecisionRule::MaxAvgVar`].
    pub variance_penalty: f64,
    /// Deal retries before the sampler gives up on a world.
    pub max_deal_attempts: usize,
    /// Soft wall-clock budget; late worlds are dropped, not awaited.
    pub time_budget_ms: Option<u64>,
    /// Master RNG seed; a fixed seed plus a single-threaded pool makes the
    /// whole decision reproducible.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    #[default]
    MaxAverage,
    MaxWeighted,
    MaxMinScore,
    MaxAvgVar,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            worlds: DEFAULT_WORLDS,
            epsilon: DEFAULT_EPSILON,
            use_threads: true,
            exploration: DEFAULT_EXPLORATION,
            decision_rule: DecisionRule::default(),
            variance_penalty: DEFAULT_VARIANCE_PENALTY,
            max_deal_attempts: DEFAULT_MAX_DEAL_ATTEMPTS,
            time_budget_ms: None,
            seed: None,
        }
    }
}

impl AiConfig {
    /// The per-world simulation count: the total budget split evenly, at
    /// least one simulation per world.
    pub fn sims_per_world(&self) -> u32 {
        (self.simulations / self.worlds.max(1)).max(1)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.simulations == 0 {
            return Err(EngineError::InvalidRequest(
                "ai_config.simulations must be at least 1".into(),
            ));
        }
        if self.worlds == 0 {
            return Err(EngineError::InvalidRequest(
                "ai_config.worlds must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(EngineError::InvalidRequest(
                "ai_config.epsilon must lie in [0, 1]".into(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(EngineError::InvalidRequest(
                "ai_config.exploration must be a non-negative number".into(),
            ));
        }
        if self.max_deal_attempts == 0 {
            return Err(EngineError::InvalidRequest(
                "ai_config.max_deal_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
