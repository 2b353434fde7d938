use hearts_core::model::card::Card;
use hearts_core::model::state::HeartsState;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// A rollout policy picks one legal card for the current player, or `None`
/// at a terminal. Policies are shared by reference across cloned searchers,
/// so they must be stateless (configuration only) or internally synchronized.
pub trait RolloutPolicy: Send + Sync {
    fn choose(&self, state: &HeartsState, rng: &mut dyn RngCore) -> Option<Card>;
}

/// Extension seam for move-pruning player variants: given the root
/// candidates, return the subset worth searching. The default keeps all.
pub trait MoveFilter: Send + Sync {
    fn filter_moves(&self, state: &HeartsState, candidates: &[Card]) -> Vec<Card>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAllMoves;

impl MoveFilter for KeepAllMoves {
    fn filter_moves(&self, _state: &HeartsState, candidates: &[Card]) -> Vec<Card> {
        candidates.to_vec()
    }
}

/// Epsilon-random duck policy: with probability epsilon a uniformly random
/// legal card, otherwise the cheapest way out of the trick.
#[derive(Debug, Clone, Copy)]
pub struct EpsilonGreedyPolicy {
    epsilon: f64,
}

impl EpsilonGreedyPolicy {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl RolloutPolicy for EpsilonGreedyPolicy {
    fn choose(&self, state: &HeartsState, rng: &mut dyn RngCore) -> Option<Card> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return None;
        }
        if legal.len() == 1 {
            return Some(legal[0]);
        }
        if self.epsilon > 0.0 && rng.gen::<f64>() < self.epsilon {
            return legal.choose(rng).copied();
        }
        Some(duck_choice(state, &legal))
    }
}

/// Deterministic duck heuristic. Following: the lowest card of the lead
/// suit. Discarding: the queen first, then the highest heart, then the
/// highest card. Leading: the lowest card that is not itself a penalty.
fn duck_choice(state: &HeartsState, legal: &[Card]) -> Card {
    match state.current_trick().lead_suit() {
        Some(lead) => {
            if let Some(card) = legal
                .iter()
                .copied()
                .filter(|card| card.suit == lead)
                .min_by_key(|card| card.rank)
            {
                return card;
            }
            if let Some(queen) = legal.iter().copied().find(|card| card.is_queen_of_spades()) {
                return queen;
            }
            legal
                .iter()
                .copied()
                .filter(|card| card.is_heart())
                .max_by_key(|card| card.rank)
                .or_else(|| legal.iter().copied().max_by_key(|card| card.rank))
                .unwrap_or(legal[0])
        }
        None => legal
            .iter()
            .copied()
            .filter(|card| !card.is_heart() && !card.is_queen_of_spades())
            .min_by_key(|card| card.rank)
            .or_else(|| legal.iter().copied().min_by_key(|card| card.rank))
            .unwrap_or(legal[0]),
    }
}

/// Negated terminal scores: higher is better for each seat.
pub fn value_vector(state: &HeartsState) -> [f64; 4] {
    let scores = state.scores();
    [-scores[0], -scores[1], -scores[2], -scores[3]]
}

/// Rolls a cloned state to terminal under `policy` and returns the value
/// vector. The input state is never mutated.
pub fn playout(state: &HeartsState, policy: &dyn RolloutPolicy, rng: &mut dyn RngCore) -> [f64; 4] {
    let mut sim = state.clone();
    while let Some(card) = policy.choose(&sim, rng) {
        if sim.apply_move(card).is_err() {
            break;
        }
    }
    value_vector(&sim)
}
