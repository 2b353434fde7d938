use core::fmt;

/// Ranks carry their natural face value; the wire index counts down from the
/// ace (`A = 0` .. `2 = 12`), so a lower index is a stronger card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ORDERED: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Ace-high wire index: `Ace = 0`, `King = 1`, .., `Two = 12`.
    pub const fn wire_index(self) -> u8 {
        14 - self.value()
    }

    pub const fn from_wire_index(index: u8) -> Option<Self> {
        if index > 12 {
            return None;
        }
        Self::from_value(14 - index)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "A" => Some(Rank::Ace),
            "K" => Some(Rank::King),
            "Q" => Some(Rank::Queen),
            "J" => Some(Rank::Jack),
            "10" => Some(Rank::Ten),
            "9" => Some(Rank::Nine),
            "8" => Some(Rank::Eight),
            "7" => Some(Rank::Seven),
            "6" => Some(Rank::Six),
            "5" => Some(Rank::Five),
            "4" => Some(Rank::Four),
            "3" => Some(Rank::Three),
            "2" => Some(Rank::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        };
        f.write_str(text)
    }
}
