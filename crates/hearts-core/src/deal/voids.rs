use crate::model::rules::Rules;
use crate::model::seat::Seat;
use crate::model::state::HeartsState;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use core::fmt;

/// A small set of suits, one bit per suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuitSet(u8);

impl SuitSet {
    pub const EMPTY: SuitSet = SuitSet(0);

    pub fn insert(&mut self, suit: Suit) {
        self.0 |= 1 << suit.index();
    }

    pub const fn contains(self, suit: Suit) -> bool {
        self.0 & (1 << suit.index()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Suit> {
        Suit::ALL.into_iter().filter(move |suit| self.contains(*suit))
    }
}

impl fmt::Display for SuitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suit in self.iter() {
            write!(f, "{suit}")?;
        }
        Ok(())
    }
}

/// Known voids per seat, inferred from the public trick history.
///
/// A seat is provably void in a suit when it discarded off-suit on a trick of
/// that suit, or when it led hearts while hearts were still unbreakable (only
/// a hand of pure hearts may do that).
#[derive(Debug, Clone, Default)]
pub struct VoidTracker {
    voids: [SuitSet; 4],
}

impl VoidTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: &HeartsState) -> Self {
        let mut tracker = Self::new();
        let rules = state.rules();
        let mut hearts_broken = false;
        for trick in state.completed_tricks() {
            tracker.scan_trick(trick, rules, &mut hearts_broken);
        }
        tracker.scan_trick(state.current_trick(), rules, &mut hearts_broken);
        tracker
    }

    pub fn mark(&mut self, seat: Seat, suit: Suit) {
        self.voids[seat.index()].insert(suit);
    }

    pub fn is_void(&self, seat: Seat, suit: Suit) -> bool {
        self.voids[seat.index()].contains(suit)
    }

    pub fn voids(&self, seat: Seat) -> SuitSet {
        self.voids[seat.index()]
    }

    fn scan_trick(&mut self, trick: &Trick, rules: Rules, hearts_broken: &mut bool) {
        let Some(lead) = trick.lead_suit() else {
            return;
        };
        if lead == Suit::Hearts && !*hearts_broken && rules.must_break_hearts() {
            for suit in Suit::ALL {
                if suit != Suit::Hearts {
                    self.mark(trick.leader(), suit);
                }
            }
        }
        for play in trick.plays() {
            if play.card.suit != lead {
                self.mark(play.seat, lead);
            }
            if play.card.is_heart()
                || (rules.queen_breaks_hearts() && play.card.is_queen_of_spades())
            {
                *hearts_broken = true;
            }
        }
    }
}

impl fmt::Display for VoidTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seat in Seat::LOOP {
            let voids = self.voids(seat);
            if voids.is_empty() {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{seat}:{voids}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
