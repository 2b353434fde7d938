//! Hearts rules model and constrained world sampling.
//!
//! This crate owns everything a search engine needs to reason about a hand of
//! Hearts: the bitset card model, the rule flags, the authoritative
//! [`HeartsState`](model::state::HeartsState) with legal-move generation and
//! scoring, and the [`deal`] module that turns an information set into
//! concrete full-information worlds.

pub mod deal;
pub mod model;
pub mod score;
