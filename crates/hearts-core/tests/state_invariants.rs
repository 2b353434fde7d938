//! Property sweeps over random playthroughs: the rules engine must keep the
//! deck closed, break hearts monotonically and never offer an illegal card.

use hearts_core::model::card::Card;
use hearts_core::model::cardset::CardSet;
use hearts_core::model::deck::Deck;
use hearts_core::model::pass::PassDirection;
use hearts_core::model::rules::Rules;
use hearts_core::model::seat::Seat;
use hearts_core::model::state::HeartsState;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn outstanding(state: &HeartsState) -> u32 {
    Seat::LOOP.iter().map(|seat| state.hand(*seat).len()).sum()
}

fn assert_deck_closed(state: &HeartsState) {
    let mut union = state.all_played();
    let mut total = state.all_played().len();
    for seat in Seat::LOOP {
        let hand = state.hand(seat);
        assert!(
            (hand & state.all_played()).is_empty(),
            "a held card is also marked played"
        );
        union |= hand;
        total += hand.len();
    }
    assert_eq!(union, CardSet::FULL, "hands and played cards must cover the deck");
    assert_eq!(total, 52, "no card may appear twice");
}

fn assert_legal_moves_sound(state: &HeartsState) {
    let seat = state.current_player();
    let hand = state.hand(seat);
    let legal = state.legal_moves();
    assert_eq!(legal.is_empty(), hand.is_empty(), "only empty hands lack moves");
    for card in &legal {
        assert!(hand.contains(*card), "legal card must be held");
    }
    if let Some(lead) = state.current_trick().lead_suit() {
        if hand.has_suit(lead) {
            assert!(
                legal.iter().all(|card| card.suit == lead),
                "must follow suit when able"
            );
        }
    }
}

fn random_playthrough(seed: u64, rules: Rules) {
    let deck = Deck::shuffled_with_seed(seed);
    let mut state = HeartsState::deal(&deck, rules, PassDirection::Hold, seed);
    let mut rng = SmallRng::seed_from_u64(seed ^ 0xDEAD_BEEF);
    let mut broken_seen = false;

    while !state.is_done() {
        assert_deck_closed(&state);
        assert_legal_moves_sound(&state);
        assert!(
            !(broken_seen && !state.hearts_broken()),
            "hearts_broken must be monotone"
        );
        broken_seen = state.hearts_broken();

        let before = outstanding(&state);
        let legal = state.legal_moves();
        let card = *legal.choose(&mut rng).expect("non-terminal state has moves");
        state.apply_move(card).expect("legal card applies cleanly");
        assert_eq!(outstanding(&state), before - 1, "each play spends one card");
    }

    assert_eq!(state.completed_tricks().len(), 13);
    assert_eq!(state.all_played(), CardSet::FULL);
    let taken: u32 = Seat::LOOP.iter().map(|seat| state.taken(*seat).len()).sum();
    assert_eq!(taken, 52);
}

#[test]
fn random_playthroughs_keep_invariants_standard_rules() {
    for seed in 0..20 {
        random_playthrough(seed, Rules::STANDARD);
    }
}

#[test]
fn random_playthroughs_keep_invariants_all_rules() {
    let rules = Rules::STANDARD
        | Rules::LEAD_2_CLUBS
        | Rules::JACK_BONUS
        | Rules::NO_TRICK_BONUS;
    for seed in 100..112 {
        random_playthrough(seed, rules);
    }
}

#[test]
fn random_playthroughs_keep_invariants_bare_rules() {
    for seed in 200..210 {
        random_playthrough(seed, Rules::NONE);
    }
}

#[test]
fn terminal_scores_account_for_all_penalties() {
    for seed in 0..12 {
        let deck = Deck::shuffled_with_seed(seed);
        let mut state = HeartsState::deal(&deck, Rules::STANDARD, PassDirection::Hold, seed);
        let mut rng = SmallRng::seed_from_u64(seed);
        while !state.is_done() {
            let legal = state.legal_moves();
            let card = *legal.choose(&mut rng).expect("moves available");
            state.apply_move(card).expect("legal move");
        }
        let total: f64 = state.scores().iter().sum();
        // 26 points split normally; 78 when somebody shot the moon.
        assert!(
            total == 26.0 || total == 78.0,
            "unexpected score total {total} for seed {seed}"
        );
    }
}

#[test]
fn queen_of_spades_always_lands_somewhere() {
    for seed in 50..60 {
        let deck = Deck::shuffled_with_seed(seed);
        let mut state = HeartsState::deal(&deck, Rules::STANDARD, PassDirection::Hold, seed);
        let mut rng = SmallRng::seed_from_u64(seed);
        while !state.is_done() {
            let legal = state.legal_moves();
            let card = *legal.choose(&mut rng).expect("moves available");
            state.apply_move(card).expect("legal move");
        }
        let holders: Vec<Seat> = Seat::LOOP
            .into_iter()
            .filter(|seat| state.taken(*seat).contains(Card::QUEEN_OF_SPADES))
            .collect();
        assert_eq!(holders.len(), 1, "seed {seed}");
    }
}
