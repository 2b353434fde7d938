//! Constrained random deals from an information set.

use crate::deal::binomial;
use crate::deal::voids::VoidTracker;
use crate::model::card::Card;
use crate::model::cardset::CardSet;
use crate::model::seat::Seat;
use crate::model::state::HeartsState;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// Deals the unseen cards to the three hidden seats, respecting known voids
/// and expected hand sizes. Sampling is rejection-free per card but restarts
/// the whole deal (bounded by `max_attempts`) when a card has no feasible
/// owner left.
#[derive(Debug, Clone)]
pub struct WorldSampler {
    max_attempts: usize,
}

/// One concrete full-information world plus its a-priori deal probability
/// (the chance an unconstrained uniform deal produces exactly this
/// assignment). Uniform within a decision, so aggregators that normalize see
/// unit weights.
#[derive(Debug, Clone)]
pub struct SampledWorld {
    pub state: HeartsState,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub enum SampleError {
    /// The observation's hand sizes cannot be reconciled with the number of
    /// unseen cards.
    InconsistentCounts { expected: usize, unseen: usize },
    /// No consistent deal was found within the attempt budget; carries the
    /// void constraints that were in force, for diagnosis.
    Exhausted { attempts: usize, voids: VoidTracker },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::InconsistentCounts { expected, unseen } => write!(
                f,
                "hidden hands need {expected} cards but {unseen} are unseen"
            ),
            SampleError::Exhausted { attempts, voids } => write!(
                f,
                "no consistent deal after {attempts} attempts (voids: {voids})"
            ),
        }
    }
}

impl std::error::Error for SampleError {}

impl WorldSampler {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Cards nobody has seen from `acting`'s point of view.
    pub fn unseen(state: &HeartsState, acting: Seat) -> CardSet {
        CardSet::FULL - state.all_played() - state.hand(acting)
    }

    /// How many cards each hidden seat must receive. A seat whose hand is
    /// already specified keeps its size; an unknown hand is anchored on the
    /// acting player's, minus one when the seat has played to the open trick.
    pub fn expected_counts(state: &HeartsState, acting: Seat) -> [usize; 4] {
        let base = state.hand(acting).len() as usize;
        let mut counts = [0usize; 4];
        for seat in Seat::LOOP {
            if seat == acting {
                continue;
            }
            let known = state.hand(seat).len() as usize;
            counts[seat.index()] = if known > 0 {
                known
            } else {
                let played_this_trick = state.current_trick().contains_seat(seat);
                base.saturating_sub(played_this_trick as usize)
            };
        }
        counts
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        state: &HeartsState,
        acting: Seat,
        voids: &VoidTracker,
        rng: &mut R,
    ) -> Result<SampledWorld, SampleError> {
        let unseen: Vec<Card> = Self::unseen(state, acting).iter().collect();
        let needs = Self::expected_counts(state, acting);
        let expected: usize = needs.iter().sum();
        // Truncated observations may carry fewer cards than a full deal; any
        // surplus unseen cards stay out of play. A deficit is unsatisfiable.
        if expected > unseen.len() {
            return Err(SampleError::InconsistentCounts {
                expected,
                unseen: unseen.len(),
            });
        }

        for _ in 0..self.max_attempts {
            if let Some(hands) = try_deal(&unseen, acting, needs, voids, rng) {
                let mut world = state.clone();
                for seat in Seat::LOOP {
                    if seat == acting {
                        continue;
                    }
                    world.reset_unplayed(seat);
                }
                let mut placed = true;
                for seat in Seat::LOOP {
                    for card in hands[seat.index()].iter() {
                        if world.assign(seat, card).is_err() {
                            placed = false;
                        }
                    }
                }
                if placed {
                    return Ok(SampledWorld {
                        state: world,
                        probability: deal_probability(unseen.len(), &needs),
                    });
                }
            }
        }

        Err(SampleError::Exhausted {
            attempts: self.max_attempts,
            voids: voids.clone(),
        })
    }
}

impl Default for WorldSampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// One randomized deal pass: place unseen cards, in random order, with a
/// uniformly chosen seat that still needs cards and is not void in the
/// card's suit. A card with no feasible owner is left out of play; the pass
/// fails when the needs cannot all be met by the end.
fn try_deal<R: Rng + ?Sized>(
    unseen: &[Card],
    acting: Seat,
    mut needs: [usize; 4],
    voids: &VoidTracker,
    rng: &mut R,
) -> Option<[CardSet; 4]> {
    let mut order = unseen.to_vec();
    order.shuffle(rng);

    let mut remaining: usize = needs.iter().sum();
    let mut hands = [CardSet::EMPTY; 4];
    let mut eligible = [Seat::North; 3];
    for card in order {
        if remaining == 0 {
            break;
        }
        let mut count = 0;
        for seat in Seat::LOOP {
            if seat == acting {
                continue;
            }
            if needs[seat.index()] > 0 && !voids.is_void(seat, card.suit) {
                eligible[count] = seat;
                count += 1;
            }
        }
        if count == 0 {
            continue;
        }
        let pick = eligible[rng.gen_range(0..count)];
        hands[pick.index()].insert(card);
        needs[pick.index()] -= 1;
        remaining -= 1;
    }
    if remaining > 0 {
        return None;
    }
    Some(hands)
}

/// Probability of one specific assignment under an unconstrained uniform
/// deal of `total` cards into the required hand sizes.
fn deal_probability(total: usize, needs: &[usize; 4]) -> f64 {
    let mut ln_ways = 0.0;
    let mut remaining = total;
    for &need in needs {
        if need == 0 {
            continue;
        }
        ln_ways += binomial::ln_choose(remaining, need);
        remaining -= need;
    }
    (-ln_ways).exp()
}
