use crate::model::card::Card;
use crate::model::cardset::CardSet;
use crate::model::deck::Deck;
use crate::model::pass::PassDirection;
use crate::model::rules::Rules;
use crate::model::seat::Seat;
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError};
use crate::score;
use std::fmt;

/// The authoritative game object: per-seat card sets, trick history and the
/// open trick. Doubles as the information set (only the acting player's hand
/// filled in) and as the fully specified simulation substrate.
#[derive(Debug, Clone)]
pub struct HeartsState {
    hands: [CardSet; 4],
    original: [CardSet; 4],
    taken: [CardSet; 4],
    all_played: CardSet,
    completed: Vec<Trick>,
    current: Trick,
    hearts_broken: bool,
    rules: Rules,
    pass_dir: PassDirection,
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: Seat },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    CardNotInHand { seat: Seat, card: Card },
    IllegalMove { seat: Seat, card: Card },
    Trick(TrickError),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::CardNotInHand { seat, card } => {
                write!(f, "{seat} does not hold {card}")
            }
            PlayError::IllegalMove { seat, card } => {
                write!(f, "{card} is not a legal play for {seat}")
            }
            PlayError::Trick(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    DuplicateCard(Card),
    TrickInProgress,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::DuplicateCard(card) => {
                write!(f, "{card} is already placed elsewhere in the hand")
            }
            SetupError::TrickInProgress => write!(f, "current trick is not empty"),
        }
    }
}

impl std::error::Error for SetupError {}

impl HeartsState {
    /// An empty state: no cards dealt, North to lead.
    pub fn new(rules: Rules, pass_dir: PassDirection, seed: u64) -> Self {
        Self {
            hands: [CardSet::EMPTY; 4],
            original: [CardSet::EMPTY; 4],
            taken: [CardSet::EMPTY; 4],
            all_played: CardSet::EMPTY,
            completed: Vec::with_capacity(13),
            current: Trick::new(Seat::North),
            hearts_broken: false,
            pass_dir: pass_dir.effective(rules),
            rules,
            seed,
        }
    }

    /// Deals a full deck round-robin; the holder of the two of clubs leads.
    pub fn deal(deck: &Deck, rules: Rules, pass_dir: PassDirection, seed: u64) -> Self {
        let mut state = Self::new(rules, pass_dir, seed);
        for (index, &card) in deck.cards().iter().enumerate() {
            let seat = index % 4;
            state.hands[seat].insert(card);
            state.original[seat].insert(card);
        }
        let leader = Seat::LOOP
            .into_iter()
            .find(|seat| state.hands[seat.index()].contains(Card::TWO_OF_CLUBS))
            .unwrap_or(Seat::North);
        state.current = Trick::new(leader);
        state
    }

    pub fn hand(&self, seat: Seat) -> CardSet {
        self.hands[seat.index()]
    }

    pub fn original(&self, seat: Seat) -> CardSet {
        self.original[seat.index()]
    }

    pub fn taken(&self, seat: Seat) -> CardSet {
        self.taken[seat.index()]
    }

    pub fn all_played(&self) -> CardSet {
        self.all_played
    }

    pub fn completed_tricks(&self) -> &[Trick] {
        &self.completed
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current
    }

    pub fn current_trick_index(&self) -> usize {
        self.completed.len()
    }

    pub fn is_first_trick(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn first_player(&self) -> Seat {
        self.current.leader()
    }

    pub fn current_player(&self) -> Seat {
        self.current.expected_seat()
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    pub fn pass_direction(&self) -> PassDirection {
        self.pass_dir
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tricks_won(&self, seat: Seat) -> usize {
        self.completed
            .iter()
            .filter(|trick| trick.winner() == Some(seat))
            .count()
    }

    /// Terminal iff every hand has been played out.
    pub fn is_done(&self) -> bool {
        self.hands.iter().all(|hand| hand.is_empty())
    }

    /// Places a card in a seat's hand during state reconstruction or world
    /// sampling. The card must not be placed anywhere else already.
    pub fn assign(&mut self, seat: Seat, card: Card) -> Result<(), SetupError> {
        if self.all_played.contains(card) {
            return Err(SetupError::DuplicateCard(card));
        }
        if self
            .original
            .iter()
            .any(|original| original.contains(card))
        {
            return Err(SetupError::DuplicateCard(card));
        }
        self.hands[seat.index()].insert(card);
        self.original[seat.index()].insert(card);
        Ok(())
    }

    /// Records a card as already won by `seat` without replaying the trick it
    /// fell in (used when a request carries winnings without full history).
    pub fn record_taken(&mut self, seat: Seat, card: Card) -> Result<(), SetupError> {
        if self.all_played.contains(card) {
            return Err(SetupError::DuplicateCard(card));
        }
        if self.hands.iter().any(|hand| hand.contains(card)) {
            return Err(SetupError::DuplicateCard(card));
        }
        self.taken[seat.index()].insert(card);
        self.all_played.insert(card);
        Ok(())
    }

    /// Forgets a seat's unplayed cards, keeping only what it has already
    /// played. The world sampler uses this to re-deal hidden hands.
    pub fn reset_unplayed(&mut self, seat: Seat) {
        self.hands[seat.index()] = CardSet::EMPTY;
        self.original[seat.index()] &= self.all_played;
    }

    /// Hands the lead to `seat`; only valid while the open trick is empty.
    pub fn set_lead(&mut self, seat: Seat) -> Result<(), SetupError> {
        if !self.current.is_empty() {
            return Err(SetupError::TrickInProgress);
        }
        self.current = Trick::new(seat);
        Ok(())
    }

    /// Hearts can be reported broken by the caller even when the visible
    /// history alone would not prove it.
    pub fn force_hearts_broken(&mut self) {
        self.hearts_broken = true;
    }

    /// Legal cards for the player to act, in stable ascending card-id order.
    ///
    /// Empty only when the hand itself is empty (terminal).
    pub fn legal_moves(&self) -> Vec<Card> {
        let hand = self.hands[self.current_player().index()];
        if hand.is_empty() {
            return Vec::new();
        }
        let first_trick = self.is_first_trick();
        let candidates = match self.current.lead_suit() {
            None => self.lead_candidates(hand, first_trick),
            Some(lead) => self.follow_candidates(hand, lead, first_trick),
        };
        candidates.iter().collect()
    }

    fn lead_candidates(&self, hand: CardSet, first_trick: bool) -> CardSet {
        if first_trick {
            if self.rules.lead_2_clubs() && hand.contains(Card::TWO_OF_CLUBS) {
                let mut only: CardSet = CardSet::EMPTY;
                only.insert(Card::TWO_OF_CLUBS);
                return only;
            }
            if self.rules.lead_clubs() && hand.has_suit(Suit::Clubs) {
                return hand.only_suit(Suit::Clubs);
            }
        }
        if self.rules.must_break_hearts() && !self.hearts_broken {
            let non_hearts = hand - hand.only_suit(Suit::Hearts);
            if !non_hearts.is_empty() {
                return non_hearts;
            }
        }
        hand
    }

    fn follow_candidates(&self, hand: CardSet, lead: Suit, first_trick: bool) -> CardSet {
        let following = hand.only_suit(lead);
        if !following.is_empty() {
            return following;
        }
        if first_trick {
            let mut filtered = hand;
            if self.rules.no_hearts_first_trick() {
                filtered -= hand.only_suit(Suit::Hearts);
            }
            if self.rules.no_queen_first_trick() {
                filtered.remove(Card::QUEEN_OF_SPADES);
            }
            if !filtered.is_empty() {
                return filtered;
            }
        }
        hand
    }

    /// Plays `card` for the current player. The card must come from
    /// [`legal_moves`](Self::legal_moves); anything else is rejected.
    pub fn apply_move(&mut self, card: Card) -> Result<PlayOutcome, PlayError> {
        let seat = self.current_player();
        if !self.hands[seat.index()].contains(card) {
            return Err(PlayError::CardNotInHand { seat, card });
        }
        if !self.legal_moves().contains(&card) {
            return Err(PlayError::IllegalMove { seat, card });
        }

        self.hands[seat.index()].remove(card);
        self.all_played.insert(card);
        if card.is_heart() || (self.rules.queen_breaks_hearts() && card.is_queen_of_spades()) {
            self.hearts_broken = true;
        }
        self.current.play(seat, card).map_err(PlayError::Trick)?;

        if let Some(winner) = self.current.winner() {
            for play in self.current.plays() {
                self.taken[winner.index()].insert(play.card);
            }
            let finished = std::mem::replace(&mut self.current, Trick::new(winner));
            self.completed.push(finished);
            Ok(PlayOutcome::TrickCompleted { winner })
        } else {
            Ok(PlayOutcome::Played)
        }
    }

    /// Signed penalty score per seat under the configured rules.
    pub fn scores(&self) -> [f64; 4] {
        score::hand_scores(self)
    }

    pub fn score(&self, seat: Seat) -> f64 {
        self.scores()[seat.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::{HeartsState, PlayError, PlayOutcome};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::pass::PassDirection;
    use crate::model::rank::Rank;
    use crate::model::rules::Rules;
    use crate::model::seat::Seat;
    use crate::model::suit::Suit;

    fn dealt(rules: Rules, seed: u64) -> HeartsState {
        let deck = Deck::shuffled_with_seed(seed);
        HeartsState::deal(&deck, rules, PassDirection::Hold, seed)
    }

    fn standard_with_lead_2c() -> Rules {
        Rules::STANDARD | Rules::LEAD_2_CLUBS
    }

    #[test]
    fn dealing_distributes_thirteen_cards_each() {
        let state = dealt(Rules::STANDARD, 7);
        for seat in Seat::LOOP {
            assert_eq!(state.hand(seat).len(), 13, "{seat} should hold 13 cards");
            assert_eq!(state.hand(seat), state.original(seat));
        }
        assert!(state.all_played().is_empty());
        assert!(!state.is_done());
    }

    #[test]
    fn leader_holds_two_of_clubs() {
        let state = dealt(Rules::STANDARD, 42);
        assert!(state.hand(state.first_player()).contains(Card::TWO_OF_CLUBS));
        assert_eq!(state.current_player(), state.first_player());
    }

    #[test]
    fn first_lead_is_two_of_clubs_under_lead_2_clubs() {
        let state = dealt(standard_with_lead_2c(), 11);
        assert_eq!(state.legal_moves(), vec![Card::TWO_OF_CLUBS]);
    }

    #[test]
    fn first_lead_is_any_club_under_lead_clubs() {
        let state = dealt(Rules::STANDARD, 11);
        let legal = state.legal_moves();
        assert!(!legal.is_empty());
        assert!(legal.iter().all(|card| card.suit == Suit::Clubs));
    }

    #[test]
    fn follow_suit_is_required() {
        let mut state = dealt(standard_with_lead_2c(), 3);
        state.apply_move(Card::TWO_OF_CLUBS).unwrap();
        let seat = state.current_player();
        if state.hand(seat).has_suit(Suit::Clubs) {
            let legal = state.legal_moves();
            assert!(legal.iter().all(|card| card.suit == Suit::Clubs));
            let off_suit = state
                .hand(seat)
                .iter()
                .find(|card| card.suit != Suit::Clubs);
            if let Some(card) = off_suit {
                assert!(matches!(
                    state.apply_move(card),
                    Err(PlayError::IllegalMove { .. })
                ));
            }
        }
    }

    #[test]
    fn completed_trick_moves_cards_to_winner() {
        let mut state = HeartsState::new(Rules::NONE, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::new(Rank::Ten, Suit::Clubs)).unwrap();
        state.assign(Seat::East, Card::new(Rank::Queen, Suit::Clubs)).unwrap();
        state.assign(Seat::South, Card::new(Rank::Four, Suit::Clubs)).unwrap();
        state.assign(Seat::West, Card::new(Rank::Ace, Suit::Spades)).unwrap();

        state.apply_move(Card::new(Rank::Ten, Suit::Clubs)).unwrap();
        state.apply_move(Card::new(Rank::Queen, Suit::Clubs)).unwrap();
        state.apply_move(Card::new(Rank::Four, Suit::Clubs)).unwrap();
        let outcome = state.apply_move(Card::new(Rank::Ace, Suit::Spades)).unwrap();

        assert_eq!(outcome, PlayOutcome::TrickCompleted { winner: Seat::East });
        assert_eq!(state.taken(Seat::East).len(), 4);
        assert_eq!(state.current_player(), Seat::East);
        assert_eq!(state.current_trick_index(), 1);
        assert!(state.is_done());
    }

    #[test]
    fn hearts_cannot_be_led_before_broken() {
        let rules = Rules::QUEEN_PENALTY | Rules::MUST_BREAK_HEARTS;
        let mut state = HeartsState::new(rules, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::new(Rank::Ace, Suit::Diamonds)).unwrap();
        state.assign(Seat::North, Card::new(Rank::Five, Suit::Hearts)).unwrap();
        state.assign(Seat::North, Card::new(Rank::Five, Suit::Clubs)).unwrap();
        state.assign(Seat::East, Card::new(Rank::Two, Suit::Diamonds)).unwrap();
        state.assign(Seat::South, Card::new(Rank::Three, Suit::Diamonds)).unwrap();
        state.assign(Seat::West, Card::new(Rank::Four, Suit::Diamonds)).unwrap();

        // North wins the opening diamond trick and leads again.
        state.apply_move(Card::new(Rank::Ace, Suit::Diamonds)).unwrap();
        state.apply_move(Card::new(Rank::Two, Suit::Diamonds)).unwrap();
        state.apply_move(Card::new(Rank::Three, Suit::Diamonds)).unwrap();
        let outcome = state.apply_move(Card::new(Rank::Four, Suit::Diamonds)).unwrap();
        assert_eq!(outcome, PlayOutcome::TrickCompleted { winner: Seat::North });
        assert!(!state.hearts_broken());

        assert_eq!(state.legal_moves(), vec![Card::new(Rank::Five, Suit::Clubs)]);

        state.force_hearts_broken();
        assert_eq!(state.legal_moves().len(), 2);
    }

    #[test]
    fn player_holding_only_hearts_may_lead_them() {
        let mut state = HeartsState::new(Rules::STANDARD, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::new(Rank::Nine, Suit::Hearts)).unwrap();
        state.assign(Seat::North, Card::new(Rank::Four, Suit::Hearts)).unwrap();
        let legal = state.legal_moves();
        assert_eq!(legal.len(), 2);
        assert!(legal.iter().all(|card| card.is_heart()));
    }

    #[test]
    fn queen_of_spades_breaks_hearts_when_enabled() {
        let rules = Rules::QUEEN_PENALTY | Rules::QUEEN_BREAKS_HEARTS;
        let mut state = HeartsState::new(rules, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::QUEEN_OF_SPADES).unwrap();
        state.apply_move(Card::QUEEN_OF_SPADES).unwrap();
        assert!(state.hearts_broken());

        let mut state = HeartsState::new(Rules::QUEEN_PENALTY, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::QUEEN_OF_SPADES).unwrap();
        state.apply_move(Card::QUEEN_OF_SPADES).unwrap();
        assert!(!state.hearts_broken());
    }

    #[test]
    fn first_trick_discards_exclude_points() {
        let mut state = HeartsState::new(Rules::STANDARD, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::TWO_OF_CLUBS).unwrap();
        state.assign(Seat::East, Card::QUEEN_OF_SPADES).unwrap();
        state.assign(Seat::East, Card::new(Rank::Nine, Suit::Hearts)).unwrap();
        state.assign(Seat::East, Card::new(Rank::Nine, Suit::Diamonds)).unwrap();
        state.apply_move(Card::TWO_OF_CLUBS).unwrap();
        // East has no clubs: the discard may be neither the queen nor a heart.
        let legal = state.legal_moves();
        assert_eq!(legal, vec![Card::new(Rank::Nine, Suit::Diamonds)]);
    }

    #[test]
    fn first_trick_fallback_when_only_penalty_cards() {
        let rules = Rules::STANDARD;
        let mut state = HeartsState::new(rules, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::TWO_OF_CLUBS).unwrap();
        state.assign(Seat::East, Card::QUEEN_OF_SPADES).unwrap();
        state.assign(Seat::East, Card::new(Rank::Nine, Suit::Hearts)).unwrap();
        state.apply_move(Card::TWO_OF_CLUBS).unwrap();
        // Only penalty cards in hand: the restriction cannot empty the move
        // list, so both remain playable.
        let legal = state.legal_moves();
        assert_eq!(legal.len(), 2);
    }

    #[test]
    fn assign_rejects_duplicates() {
        let mut state = HeartsState::new(Rules::STANDARD, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::QUEEN_OF_SPADES).unwrap();
        assert!(state.assign(Seat::East, Card::QUEEN_OF_SPADES).is_err());
    }

    #[test]
    fn apply_move_rejects_cards_not_held() {
        let mut state = HeartsState::new(Rules::NONE, PassDirection::Hold, 0);
        state.assign(Seat::North, Card::TWO_OF_CLUBS).unwrap();
        assert!(matches!(
            state.apply_move(Card::QUEEN_OF_SPADES),
            Err(PlayError::CardNotInHand { .. })
        ));
    }
}
