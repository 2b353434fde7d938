//! Terminal hand scoring.
//!
//! Raw penalties come from the taken piles: one point per heart, thirteen for
//! the queen of spades under `queen_penalty`. A moon shot inverts the hand:
//! the shooter drops to zero and everyone else is charged the full moon
//! value. The jack-of-diamonds bonus and the no-trick bonus sit outside the
//! moon predicate and always apply to whoever earned them.

use crate::model::card::Card;
use crate::model::cardset::CardSet;
use crate::model::seat::Seat;
use crate::model::state::HeartsState;
use crate::model::suit::Suit;

/// The cards that must all land in one pile for a moon shot under `rules`.
fn moon_cards(state: &HeartsState) -> CardSet {
    let mut cards = CardSet::FULL.only_suit(Suit::Hearts);
    if state.rules().queen_penalty() {
        cards.insert(Card::QUEEN_OF_SPADES);
    }
    cards
}

/// Signed penalty per seat for the hand as played so far.
pub fn hand_scores(state: &HeartsState) -> [f64; 4] {
    let rules = state.rules();
    let moon = moon_cards(state);
    let shooter = Seat::LOOP
        .into_iter()
        .find(|seat| moon.is_subset_of(state.taken(*seat)));

    let mut scores = [0.0_f64; 4];
    for seat in Seat::LOOP {
        let taken = state.taken(seat);
        let mut score = match shooter {
            Some(who) if who == seat => 0.0,
            Some(_) => rules.moon_value(),
            None => {
                let mut raw = taken.suit_len(Suit::Hearts) as f64;
                if rules.queen_penalty() && taken.contains(Card::QUEEN_OF_SPADES) {
                    raw += 13.0;
                }
                raw
            }
        };
        if rules.jack_bonus() && taken.contains(Card::JACK_OF_DIAMONDS) {
            score -= 10.0;
        }
        if rules.no_trick_bonus() && state.tricks_won(seat) == 0 {
            score -= 5.0;
        }
        scores[seat.index()] = score;
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::hand_scores;
    use crate::model::card::Card;
    use crate::model::pass::PassDirection;
    use crate::model::rank::Rank;
    use crate::model::rules::Rules;
    use crate::model::seat::Seat;
    use crate::model::state::HeartsState;
    use crate::model::suit::Suit;

    fn state_with_taken(rules: Rules, piles: [&[Card]; 4]) -> HeartsState {
        let mut state = HeartsState::new(rules, PassDirection::Hold, 0);
        for (index, pile) in piles.iter().enumerate() {
            let seat = Seat::from_index(index).expect("seat index");
            for &card in pile.iter() {
                state.record_taken(seat, card).expect("unique card");
            }
        }
        state
    }

    fn all_hearts() -> Vec<Card> {
        Rank::ORDERED
            .into_iter()
            .map(|rank| Card::new(rank, Suit::Hearts))
            .collect()
    }

    #[test]
    fn queen_alone_scores_thirteen() {
        let state = state_with_taken(Rules::QUEEN_PENALTY, [&[Card::QUEEN_OF_SPADES], &[], &[], &[]]);
        assert_eq!(state.score(Seat::North), 13.0);
    }

    #[test]
    fn queen_scores_nothing_without_the_rule() {
        let state = state_with_taken(Rules::NONE, [&[Card::QUEEN_OF_SPADES], &[], &[], &[]]);
        assert_eq!(state.score(Seat::North), 0.0);
    }

    #[test]
    fn queen_plus_hearts_combine() {
        let taken = [
            Card::QUEEN_OF_SPADES,
            Card::new(Rank::Two, Suit::Hearts),
            Card::new(Rank::Three, Suit::Hearts),
            Card::new(Rank::Four, Suit::Hearts),
        ];
        let state = state_with_taken(Rules::QUEEN_PENALTY, [&taken, &[], &[], &[]]);
        assert_eq!(state.score(Seat::North), 16.0);
    }

    #[test]
    fn moon_shot_inverts_scores() {
        let mut pile = all_hearts();
        pile.push(Card::QUEEN_OF_SPADES);
        let state = state_with_taken(Rules::QUEEN_PENALTY, [&[], &pile, &[], &[]]);
        assert_eq!(state.scores(), [26.0, 0.0, 26.0, 26.0]);
    }

    #[test]
    fn hearts_alone_do_not_shoot_the_moon_when_queen_counts() {
        let pile = all_hearts();
        let state = state_with_taken(Rules::QUEEN_PENALTY, [&pile, &[], &[], &[]]);
        // Thirteen hearts without the queen is a plain 13-point hand.
        assert_eq!(state.scores(), [13.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn moon_without_queen_rule_needs_only_hearts() {
        let pile = all_hearts();
        let state = state_with_taken(Rules::NONE, [&pile, &[], &[], &[]]);
        assert_eq!(state.scores(), [0.0, 13.0, 13.0, 13.0]);
    }

    #[test]
    fn jack_bonus_applies_outside_the_moon_predicate() {
        let rules = Rules::QUEEN_PENALTY | Rules::JACK_BONUS;
        let mut pile = all_hearts();
        pile.push(Card::QUEEN_OF_SPADES);
        pile.push(Card::JACK_OF_DIAMONDS);
        let state = state_with_taken(rules, [&pile, &[], &[], &[]]);
        // Shooter still collects the jack bonus on top of the inverted score.
        assert_eq!(state.scores(), [-10.0, 26.0, 26.0, 26.0]);
    }

    #[test]
    fn jack_bonus_subtracts_ten() {
        let rules = Rules::QUEEN_PENALTY | Rules::JACK_BONUS;
        let taken = [Card::JACK_OF_DIAMONDS, Card::new(Rank::Ace, Suit::Hearts)];
        let state = state_with_taken(rules, [&[], &taken, &[], &[]]);
        assert_eq!(state.score(Seat::East), -9.0);
    }

    #[test]
    fn no_trick_bonus_rewards_empty_hands() {
        let rules = Rules::QUEEN_PENALTY | Rules::NO_TRICK_BONUS;
        let state = state_with_taken(rules, [&[], &[], &[], &[]]);
        // Nobody has completed a trick in this synthetic state, so all four
        // collect the bonus.
        assert_eq!(state.scores(), [-5.0, -5.0, -5.0, -5.0]);
    }
}
