use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const QUEEN_OF_SPADES: Card = Card::new(Rank::Queen, Suit::Spades);
    pub const JACK_OF_DIAMONDS: Card = Card::new(Rank::Jack, Suit::Diamonds);
    pub const TWO_OF_CLUBS: Card = Card::new(Rank::Two, Suit::Clubs);

    pub const fn is_heart(self) -> bool {
        self.suit.is_heart()
    }

    pub const fn is_queen_of_spades(self) -> bool {
        matches!(self.rank, Rank::Queen) && matches!(self.suit, Suit::Spades)
    }

    pub const fn is_jack_of_diamonds(self) -> bool {
        matches!(self.rank, Rank::Jack) && matches!(self.suit, Suit::Diamonds)
    }

    /// Unique id in `0..52`, computed as `suit * 13 + rank` with the ace-high
    /// rank index. The encoding is wire-stable and round-trippable.
    pub const fn id(self) -> u8 {
        self.suit.index() as u8 * 13 + self.rank.wire_index()
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        if id >= 52 {
            return None;
        }
        let suit = match Suit::from_index((id / 13) as usize) {
            Some(suit) => suit,
            None => return None,
        };
        let rank = match Rank::from_wire_index(id % 13) {
            Some(rank) => rank,
            None => return None,
        };
        Some(Card::new(rank, suit))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError {
    text: String,
}

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed card {:?} (expected e.g. \"QS\" or \"10H\")", self.text)
    }
}

impl std::error::Error for ParseCardError {}

impl FromStr for Card {
    type Err = ParseCardError;

    /// Parses the `{rank}{suit}` wire form: `"QS"`, `"10H"`, `"2C"`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || ParseCardError {
            text: text.to_string(),
        };
        if text.len() < 2 {
            return Err(err());
        }
        let (rank_part, suit_part) = text.split_at(text.len() - 1);
        let suit_symbol = suit_part.chars().next().ok_or_else(err)?;
        let suit = Suit::from_symbol(suit_symbol).ok_or_else(err)?;
        let rank = Rank::from_symbol(rank_part).ok_or_else(err)?;
        Ok(Card::new(rank, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, Rank, Suit};

    #[test]
    fn id_round_trips_for_all_cards() {
        for id in 0..52 {
            let card = Card::from_id(id).expect("valid id");
            assert_eq!(card.id(), id);
        }
        assert_eq!(Card::from_id(52), None);
    }

    #[test]
    fn id_known_values() {
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).id(), 0);
        assert_eq!(Card::new(Rank::Two, Suit::Spades).id(), 12);
        assert_eq!(Card::new(Rank::Ace, Suit::Diamonds).id(), 13);
        assert_eq!(Card::QUEEN_OF_SPADES.id(), 2);
        assert_eq!(Card::TWO_OF_CLUBS.id(), 38);
        assert_eq!(Card::new(Rank::Two, Suit::Hearts).id(), 51);
    }

    #[test]
    fn special_cards_identified() {
        assert!(Card::QUEEN_OF_SPADES.is_queen_of_spades());
        assert!(Card::JACK_OF_DIAMONDS.is_jack_of_diamonds());
        assert!(!Card::QUEEN_OF_SPADES.is_heart());
        assert!(Card::new(Rank::Ace, Suit::Hearts).is_heart());
    }

    #[test]
    fn wire_strings_round_trip() {
        for id in 0..52 {
            let card = Card::from_id(id).expect("valid id");
            let parsed: Card = card.to_string().parse().expect("parse back");
            assert_eq!(parsed, card);
        }
    }

    #[test]
    fn parse_known_strings() {
        assert_eq!("QS".parse::<Card>().unwrap(), Card::QUEEN_OF_SPADES);
        assert_eq!(
            "10H".parse::<Card>().unwrap(),
            Card::new(Rank::Ten, Suit::Hearts)
        );
        assert_eq!("2C".parse::<Card>().unwrap(), Card::TWO_OF_CLUBS);
        assert!("".parse::<Card>().is_err());
        assert!("QQ".parse::<Card>().is_err());
        assert!("1S".parse::<Card>().is_err());
    }

    #[test]
    fn serde_uses_the_string_form() {
        let json = serde_json::to_string(&Card::QUEEN_OF_SPADES).unwrap();
        assert_eq!(json, "\"QS\"");
        let back: Card = serde_json::from_str("\"10D\"").unwrap();
        assert_eq!(back, Card::new(Rank::Ten, Suit::Diamonds));
        assert!(serde_json::from_str::<Card>("\"XX\"").is_err());
    }
}
