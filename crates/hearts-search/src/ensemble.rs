//! The PIMC coordinator: sample worlds, search each independently, vote.

use crate::config::{AiConfig, DecisionRule};
use crate::error::EngineError;
use crate::policy::{EpsilonGreedyPolicy, KeepAllMoves, MoveFilter, RolloutPolicy};
use crate::pool::{CompletionQueue, PoolError, WorkerPool};
use crate::seeding::derive_seed;
use crate::uct::{MoveStats, Uct};
use hearts_core::deal::{SampleError, SampledWorld, VoidTracker, WorldSampler};
use hearts_core::model::card::Card;
use hearts_core::model::seat::Seat;
use hearts_core::model::state::HeartsState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one decision.
#[derive(Debug, Clone)]
pub struct Decision {
    pub card: Card,
    /// False when a single legal move short-circuited the search.
    pub searched: bool,
    pub worlds_used: usize,
    pub worlds_failed: usize,
    pub worlds_dropped: usize,
}

struct WorldResult {
    world_index: u32,
    weight: f64,
    stats: Vec<MoveStats>,
}

/// Fans `W` sampled worlds across a worker pool, runs an independent UCT
/// search in each and aggregates the per-move statistics under the
/// configured decision rule.
pub struct PimcEnsemble {
    config: AiConfig,
    prototype: Uct,
    sampler: WorldSampler,
    filter: Arc<dyn MoveFilter>,
}

impl PimcEnsemble {
    pub fn new(config: AiConfig) -> Self {
        let policy: Arc<dyn RolloutPolicy> = Arc::new(EpsilonGreedyPolicy::new(config.epsilon));
        let prototype = Uct::new(config.sims_per_world(), config.exploration, policy);
        let sampler = WorldSampler::new(config.max_deal_attempts);
        Self {
            config,
            prototype,
            sampler,
            filter: Arc::new(KeepAllMoves),
        }
    }

    /// Installs a move-pruning filter in front of the search.
    pub fn with_filter(mut self, filter: Arc<dyn MoveFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Chooses one legal card for `acting` from its information set.
    ///
    /// `pool` is consulted only when the configuration enables threads;
    /// otherwise every world is searched inline on the calling thread.
    pub fn choose_move(
        &self,
        observation: &HeartsState,
        acting: Seat,
        pool: Option<&WorkerPool>,
        master_seed: u64,
    ) -> Result<Decision, EngineError> {
        if observation.current_player() != acting {
            return Err(EngineError::InconsistentState(format!(
                "{} is to act, not {acting}",
                observation.current_player()
            )));
        }
        let legal = observation.legal_moves();
        if legal.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }
        let mut candidates = self.filter.filter_moves(observation, &legal);
        if candidates.is_empty() {
            candidates = legal;
        }
        if candidates.len() == 1 {
            debug!(card = %candidates[0], "single legal move, skipping search");
            return Ok(Decision {
                card: candidates[0],
                searched: false,
                worlds_used: 0,
                worlds_failed: 0,
                worlds_dropped: 0,
            });
        }

        let voids = VoidTracker::from_state(observation);
        let (worlds, sample_failures) =
            self.sample_worlds(observation, acting, &voids, master_seed)?;
        debug!(
            world_count = worlds.len(),
            failed = sample_failures,
            voids = %voids,
            "sampled worlds"
        );

        let deadline = self
            .config
            .time_budget_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let (mut results, search_failures, dropped) =
            self.run_searches(worlds, master_seed, pool, deadline);
        if results.is_empty() {
            return Err(EngineError::Internal(
                "every sampled world failed to produce search results".into(),
            ));
        }
        // Completion order is nondeterministic under a threaded pool; fix it
        // so aggregation is order-independent.
        results.sort_by_key(|result| result.world_index);

        let failed = sample_failures + search_failures;
        if failed > 0 || dropped > 0 {
            warn!(failed, dropped, "decision is best-effort");
        }

        let card = self.aggregate(&candidates, &results, acting)?;
        info!(
            %card,
            worlds = results.len(),
            rule = ?self.config.decision_rule,
            "chose move"
        );
        Ok(Decision {
            card,
            searched: true,
            worlds_used: results.len(),
            worlds_failed: failed,
            worlds_dropped: dropped,
        })
    }

    fn sample_worlds(
        &self,
        observation: &HeartsState,
        acting: Seat,
        voids: &VoidTracker,
        master_seed: u64,
    ) -> Result<(Vec<(u32, SampledWorld)>, usize), EngineError> {
        let mut worlds = Vec::with_capacity(self.config.worlds as usize);
        let mut failures = 0usize;
        let mut last_exhausted: Option<SampleError> = None;
        for index in 0..self.config.worlds {
            let mut rng = StdRng::seed_from_u64(derive_seed(master_seed, u64::from(index) * 2));
            match self.sampler.sample(observation, acting, voids, &mut rng) {
                Ok(world) => worlds.push((index, world)),
                Err(err @ SampleError::InconsistentCounts { .. }) => {
                    return Err(EngineError::InconsistentState(err.to_string()));
                }
                Err(err) => {
                    failures += 1;
                    last_exhausted = Some(err);
                }
            }
        }
        if worlds.is_empty() {
            return Err(match last_exhausted {
                Some(SampleError::Exhausted { attempts, voids }) => EngineError::SamplerFailure {
                    attempts,
                    voids: voids.to_string(),
                },
                _ => EngineError::Internal("sampler produced no worlds".into()),
            });
        }
        Ok((worlds, failures))
    }

    fn run_searches(
        &self,
        worlds: Vec<(u32, SampledWorld)>,
        master_seed: u64,
        pool: Option<&WorkerPool>,
        deadline: Option<Instant>,
    ) -> (Vec<WorldResult>, usize, usize) {
        let queue: CompletionQueue<Result<WorldResult, PoolError>> = CompletionQueue::new();
        let submitted = worlds.len();
        let threaded = self.config.use_threads;

        match pool.filter(|_| threaded) {
            Some(pool) => {
                for (world_index, world) in worlds {
                    let searcher = self.prototype.clone();
                    let results = queue.clone();
                    let seed = derive_seed(master_seed, u64::from(world_index) * 2 + 1);
                    let outcome = pool.submit(move || {
                        results.push(search_world(&searcher, world_index, world, seed));
                    });
                    if let Err(err) = outcome {
                        // Pool is shutting down; the world is gone with the
                        // rejected closure, count it as failed.
                        queue.push(Err(err));
                    }
                }
            }
            None => {
                for (world_index, world) in worlds {
                    let seed = derive_seed(master_seed, u64::from(world_index) * 2 + 1);
                    queue.push(search_world(&self.prototype, world_index, world, seed));
                }
            }
        }

        let mut results = Vec::with_capacity(submitted);
        let mut failures = 0usize;
        let mut dropped = 0usize;
        for collected in 0..submitted {
            let item = match deadline {
                Some(deadline) => match queue.pop_until(deadline) {
                    Some(item) => item,
                    None => {
                        dropped = submitted - collected;
                        warn!(dropped, "deadline reached, dropping unfinished worlds");
                        break;
                    }
                },
                None => queue.pop(),
            };
            match item {
                Ok(result) => results.push(result),
                Err(err) => {
                    failures += 1;
                    warn!(error = %err, "world search failed");
                }
            }
        }
        (results, failures, dropped)
    }

    fn aggregate(
        &self,
        candidates: &[Card],
        results: &[WorldResult],
        acting: Seat,
    ) -> Result<Card, EngineError> {
        let who = acting.index();
        let lambda = self.config.variance_penalty;
        let mut best: Option<(Card, f64, u64)> = None;

        for &card in candidates {
            let mut values = Vec::with_capacity(results.len());
            let mut weights = Vec::with_capacity(results.len());
            let mut visits = 0u64;
            for result in results {
                if let Some(stats) = result.stats.iter().find(|s| s.card == card) {
                    values.push(stats.value[who]);
                    weights.push(result.weight);
                    visits += u64::from(stats.visits);
                }
            }
            // Unvisited in every world: disqualified.
            if values.is_empty() {
                continue;
            }
            let score = apply_rule(self.config.decision_rule, &values, &weights, lambda);
            let better = match best {
                None => true,
                Some((_, best_score, best_visits)) => {
                    score > best_score || (score == best_score && visits > best_visits)
                }
            };
            if better {
                best = Some((card, score, visits));
            }
        }

        best.map(|(card, ..)| card).ok_or_else(|| {
            EngineError::Internal("no candidate move was visited in any world".into())
        })
    }
}

fn search_world(
    searcher: &Uct,
    world_index: u32,
    world: SampledWorld,
    seed: u64,
) -> Result<WorldResult, PoolError> {
    catch_unwind(AssertUnwindSafe(|| searcher.search(&world.state, seed)))
        .map(|stats| WorldResult {
            world_index,
            weight: world.probability,
            stats,
        })
        .map_err(|_| PoolError::TaskPanicked(format!("search of world {world_index} panicked")))
}

fn apply_rule(rule: DecisionRule, values: &[f64], weights: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    match rule {
        DecisionRule::MaxAverage => values.iter().sum::<f64>() / n,
        DecisionRule::MaxWeighted => {
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                values.iter().sum::<f64>() / n
            } else {
                values
                    .iter()
                    .zip(weights)
                    .map(|(value, weight)| value * weight)
                    .sum::<f64>()
                    / total
            }
        }
        DecisionRule::MaxMinScore => values.iter().copied().fold(f64::INFINITY, f64::min),
        DecisionRule::MaxAvgVar => {
            let mean = values.iter().sum::<f64>() / n;
            let variance = values
                .iter()
                .map(|value| (value - mean) * (value - mean))
                .sum::<f64>()
                / n;
            mean - lambda * variance.sqrt()
        }
    }
}
