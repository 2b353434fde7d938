use crate::model::card::Card;
use crate::model::seat::Seat;
use crate::model::suit::Suit;
use std::fmt;

/// An ordered sequence of up to four plays. The lead suit is the suit of the
/// first play; after four plays the trick is closed and has a winner.
#[derive(Debug, Clone)]
pub struct Trick {
    leader: Seat,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub seat: Seat,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn { expected: Seat, actual: Seat },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already complete"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub fn new(leader: Seat) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    pub fn contains_seat(&self, seat: Seat) -> bool {
        self.plays.iter().any(|play| play.seat == seat)
    }

    pub fn expected_seat(&self) -> Seat {
        self.plays
            .last()
            .map(|play| play.seat.next())
            .unwrap_or(self.leader)
    }

    pub fn play(&mut self, seat: Seat, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }
        let expected = self.expected_seat();
        if expected != seat {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        self.plays.push(Play { seat, card });
        Ok(())
    }

    /// Winner of a closed trick: the highest card in the lead suit.
    pub fn winner(&self) -> Option<Seat> {
        if !self.is_complete() {
            return None;
        }
        let lead_suit = self.lead_suit()?;
        self.plays
            .iter()
            .filter(|play| play.card.suit == lead_suit)
            .max_by(|a, b| a.card.rank.cmp(&b.card.rank))
            .map(|play| play.seat)
    }

    /// Seat currently winning an open trick, if any card has been led.
    pub fn provisional_winner(&self) -> Option<Seat> {
        let lead_suit = self.lead_suit()?;
        self.plays
            .iter()
            .filter(|play| play.card.suit == lead_suit)
            .max_by(|a, b| a.card.rank.cmp(&b.card.rank))
            .map(|play| play.seat)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trick, TrickError};
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::seat::Seat;
    use crate::model::suit::Suit;

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = Trick::new(Seat::North);
        assert!(trick.play(Seat::North, Card::TWO_OF_CLUBS).is_ok());
        assert!(matches!(
            trick.play(Seat::South, Card::new(Rank::Three, Suit::Clubs)),
            Err(TrickError::OutOfTurn { .. })
        ));
    }

    #[test]
    fn winner_is_highest_card_of_lead_suit() {
        let mut trick = Trick::new(Seat::North);
        trick
            .play(Seat::North, Card::new(Rank::Ten, Suit::Clubs))
            .unwrap();
        trick
            .play(Seat::East, Card::new(Rank::Queen, Suit::Clubs))
            .unwrap();
        trick
            .play(Seat::South, Card::new(Rank::Four, Suit::Clubs))
            .unwrap();
        trick
            .play(Seat::West, Card::new(Rank::Ace, Suit::Spades))
            .unwrap();

        assert!(trick.is_complete());
        assert_eq!(trick.winner(), Some(Seat::East));
    }

    #[test]
    fn off_suit_cards_never_win() {
        let mut trick = Trick::new(Seat::East);
        trick
            .play(Seat::East, Card::new(Rank::Two, Suit::Diamonds))
            .unwrap();
        trick.play(Seat::South, Card::QUEEN_OF_SPADES).unwrap();
        trick
            .play(Seat::West, Card::new(Rank::Ace, Suit::Hearts))
            .unwrap();
        trick
            .play(Seat::North, Card::new(Rank::Three, Suit::Diamonds))
            .unwrap();

        assert_eq!(trick.winner(), Some(Seat::North));
    }

    #[test]
    fn provisional_winner_tracks_open_trick() {
        let mut trick = Trick::new(Seat::East);
        assert_eq!(trick.provisional_winner(), None);
        trick
            .play(Seat::East, Card::new(Rank::Seven, Suit::Diamonds))
            .unwrap();
        trick.play(Seat::South, Card::QUEEN_OF_SPADES).unwrap();
        assert_eq!(trick.provisional_winner(), Some(Seat::East));
    }

    #[test]
    fn fifth_play_is_rejected() {
        let mut trick = Trick::new(Seat::North);
        for (seat, rank) in [
            (Seat::North, Rank::Two),
            (Seat::East, Rank::Three),
            (Seat::South, Rank::Four),
            (Seat::West, Rank::Five),
        ] {
            trick.play(seat, Card::new(rank, Suit::Clubs)).unwrap();
        }
        assert!(matches!(
            trick.play(Seat::North, Card::new(Rank::Six, Suit::Clubs)),
            Err(TrickError::TrickComplete)
        ));
    }
}
