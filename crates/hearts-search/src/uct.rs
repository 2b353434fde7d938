use crate::policy::{playout, value_vector, RolloutPolicy};
use crate::seeding::derive_seed;
use hearts_core::model::card::Card;
use hearts_core::model::seat::Seat;
use hearts_core::model::state::HeartsState;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// UCB1 tree search over a fully specified world.
///
/// The searcher owns only configuration plus a shared handle to its playout
/// policy; the tree itself lives for a single [`search`](Uct::search) call.
/// Clones duplicate the policy handle, never the policy, so one searcher can
/// be scattered across workers cheaply.
#[derive(Clone)]
pub struct Uct {
    iterations: u32,
    exploration: f64,
    policy: Arc<dyn RolloutPolicy>,
}

/// Accumulated statistics for one root move: visit count and the mean value
/// vector of all rollouts routed through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStats {
    pub card: Card,
    pub visits: u32,
    pub value: [f64; 4],
}

struct Edge {
    card: Card,
    visits: u32,
    value_sum: [f64; 4],
    child: Option<Box<Node>>,
}

struct Node {
    to_act: Seat,
    edges: Vec<Edge>,
}

impl Node {
    fn from_state(state: &HeartsState) -> Self {
        Self {
            to_act: state.current_player(),
            edges: state
                .legal_moves()
                .into_iter()
                .map(|card| Edge {
                    card,
                    visits: 0,
                    value_sum: [0.0; 4],
                    child: None,
                })
                .collect(),
        }
    }

    fn total_visits(&self) -> u32 {
        self.edges.iter().map(|edge| edge.visits).sum()
    }

    /// Unvisited edges first (random among them), then the UCB1 maximum for
    /// the player to act. Ties fall to the higher mean value, then the
    /// higher visit count.
    fn select(&self, exploration: f64, rng: &mut SmallRng) -> Option<usize> {
        if self.edges.is_empty() {
            return None;
        }
        let unvisited: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.visits == 0)
            .map(|(index, _)| index)
            .collect();
        if !unvisited.is_empty() {
            return unvisited.choose(rng).copied();
        }

        let ln_total = f64::from(self.total_visits().max(1)).ln();
        let who = self.to_act.index();
        let mut best: Option<(usize, f64, f64, u32)> = None;
        for (index, edge) in self.edges.iter().enumerate() {
            let visits = f64::from(edge.visits);
            let mean = edge.value_sum[who] / visits;
            let ucb = mean + exploration * (ln_total / visits).sqrt();
            let better = match best {
                None => true,
                Some((_, best_ucb, best_mean, best_visits)) => {
                    ucb > best_ucb
                        || (ucb == best_ucb && (mean, edge.visits) > (best_mean, best_visits))
                }
            };
            if better {
                best = Some((index, ucb, mean, edge.visits));
            }
        }
        best.map(|(index, ..)| index)
    }
}

impl Uct {
    pub fn new(iterations: u32, exploration: f64, policy: Arc<dyn RolloutPolicy>) -> Self {
        Self {
            iterations: iterations.max(1),
            exploration,
            policy,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn policy(&self) -> Arc<dyn RolloutPolicy> {
        Arc::clone(&self.policy)
    }

    /// Runs the configured number of iterations from `root` and returns the
    /// per-move statistics of every root edge visited at least once. The sum
    /// of root visit counts equals the iteration count.
    pub fn search(&self, root: &HeartsState, seed: u64) -> Vec<MoveStats> {
        let mut root_node = Node::from_state(root);
        if root_node.edges.is_empty() {
            return Vec::new();
        }
        let mut select_rng = SmallRng::seed_from_u64(derive_seed(seed, 0));
        for iteration in 0..self.iterations {
            let mut state = root.clone();
            let mut playout_rng =
                SmallRng::seed_from_u64(derive_seed(seed, 1 + u64::from(iteration)));
            self.simulate(&mut root_node, &mut state, &mut select_rng, &mut playout_rng);
        }

        root_node
            .edges
            .iter()
            .filter(|edge| edge.visits > 0)
            .map(|edge| {
                let n = f64::from(edge.visits);
                MoveStats {
                    card: edge.card,
                    visits: edge.visits,
                    value: [
                        edge.value_sum[0] / n,
                        edge.value_sum[1] / n,
                        edge.value_sum[2] / n,
                        edge.value_sum[3] / n,
                    ],
                }
            })
            .collect()
    }

    fn simulate(
        &self,
        node: &mut Node,
        state: &mut HeartsState,
        select_rng: &mut SmallRng,
        playout_rng: &mut SmallRng,
    ) -> [f64; 4] {
        let Some(index) = node.select(self.exploration, select_rng) else {
            // Terminal node: score the state as it stands.
            return value_vector(state);
        };
        let card = node.edges[index].card;
        let first_visit = node.edges[index].visits == 0;
        if state.apply_move(card).is_err() {
            return value_vector(state);
        }

        let value = if first_visit {
            node.edges[index].child = Some(Box::new(Node::from_state(state)));
            playout(state, self.policy.as_ref(), playout_rng)
        } else if let Some(child) = node.edges[index].child.as_mut() {
            self.simulate(child, state, select_rng, playout_rng)
        } else {
            playout(state, self.policy.as_ref(), playout_rng)
        };

        let edge = &mut node.edges[index];
        edge.visits += 1;
        for i in 0..4 {
            edge.value_sum[i] += value[i];
        }
        value
    }
}
