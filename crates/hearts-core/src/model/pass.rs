use crate::model::rules::Rules;
use crate::model::seat::Seat;
use core::fmt;

/// Passing direction for the hand, carried on the wire as a seat offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassDirection {
    Left,
    Right,
    Across,
    #[default]
    Hold,
}

impl PassDirection {
    /// Wire offsets: Left = +1, Right = -1, Across = +2, Hold = 0.
    pub const fn offset(self) -> i8 {
        match self {
            PassDirection::Left => 1,
            PassDirection::Right => -1,
            PassDirection::Across => 2,
            PassDirection::Hold => 0,
        }
    }

    pub const fn from_offset(offset: i8) -> Option<Self> {
        match offset {
            1 => Some(PassDirection::Left),
            -1 => Some(PassDirection::Right),
            2 => Some(PassDirection::Across),
            0 => Some(PassDirection::Hold),
            _ => None,
        }
    }

    /// A pass direction only takes effect when the rules enable passing;
    /// otherwise the hand is played as a hold hand.
    pub const fn effective(self, rules: Rules) -> PassDirection {
        if rules.do_pass_cards() {
            self
        } else {
            PassDirection::Hold
        }
    }

    pub const fn target(self, seat: Seat) -> Seat {
        match self {
            PassDirection::Left => seat.next(),
            PassDirection::Right => seat.previous(),
            PassDirection::Across => seat.opposite(),
            PassDirection::Hold => seat,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PassDirection::Left => "Left",
            PassDirection::Right => "Right",
            PassDirection::Across => "Across",
            PassDirection::Hold => "Hold",
        }
    }
}

impl fmt::Display for PassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
