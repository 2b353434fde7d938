//! The request/response contract the engine consumes and exposes.
//!
//! The transport front-end is someone else's problem; this module owns the
//! shapes on the wire (cards as `{rank}{suit}` strings, rules as an integer
//! bitmask or a flag object) and the reconstruction of a [`HeartsState`]
//! from the observed history.

use crate::config::AiConfig;
use crate::error::EngineError;
use hearts_core::model::card::Card;
use hearts_core::model::pass::PassDirection;
use hearts_core::model::rules::Rules;
use hearts_core::model::seat::Seat;
use hearts_core::model::state::HeartsState;
use serde::{Deserialize, Serialize};

/// One full decision request.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub game_state: GameStateData,
    #[serde(default)]
    pub ai_config: AiConfig,
}

/// The acting player's observation of the hand.
#[derive(Debug, Clone, Deserialize)]
pub struct GameStateData {
    pub player_hand: Vec<Card>,
    #[serde(default)]
    pub current_player: u8,
    #[serde(default)]
    pub current_trick: Option<TrickData>,
    #[serde(default)]
    pub trick_history: Vec<CompletedTrickData>,
    /// Cards each player has already won; redundant with the history and
    /// cross-checked against it.
    #[serde(default)]
    pub played_cards: Vec<Vec<Card>>,
    /// Cumulative match scores; informational only.
    #[serde(default)]
    pub scores: Vec<f64>,
    #[serde(default)]
    pub hearts_broken: bool,
    /// Seat offset: +1 left, -1 right, +2 across, 0 hold.
    #[serde(default)]
    pub pass_direction: i8,
    #[serde(default)]
    pub rules: Option<RulesInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrickData {
    #[serde(default)]
    pub lead_player: u8,
    #[serde(default)]
    pub cards: Vec<TrickCardData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletedTrickData {
    #[serde(default)]
    pub lead_player: u8,
    #[serde(default)]
    pub winner: u8,
    #[serde(default)]
    pub cards: Vec<TrickCardData>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrickCardData {
    pub player: u8,
    pub card: Card,
}

/// Rules arrive either as the raw bitmask or as individual flags. Absent
/// flags take the standard-game defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RulesInput {
    Bits(u16),
    Flags(RuleFlags),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleFlags {
    pub queen_penalty: bool,
    pub jack_bonus: bool,
    pub no_trick_bonus: bool,
    pub must_break_hearts: bool,
    pub queen_breaks_hearts: bool,
    pub do_pass_cards: bool,
    pub no_hearts_first_trick: bool,
    pub no_queen_first_trick: bool,
    pub lead_clubs: bool,
    pub lead_2_clubs: bool,
}

impl Default for RuleFlags {
    fn default() -> Self {
        Self {
            queen_penalty: true,
            jack_bonus: false,
            no_trick_bonus: false,
            must_break_hearts: true,
            queen_breaks_hearts: true,
            do_pass_cards: false,
            no_hearts_first_trick: true,
            no_queen_first_trick: true,
            lead_clubs: true,
            lead_2_clubs: false,
        }
    }
}

impl RulesInput {
    pub fn to_rules(&self) -> Rules {
        match self {
            RulesInput::Bits(bits) => Rules::from_bits(*bits),
            RulesInput::Flags(flags) => {
                let mut rules = Rules::NONE;
                let mut set = |on: bool, flag: Rules| {
                    if on {
                        rules = rules | flag;
                    }
                };
                set(flags.queen_penalty, Rules::QUEEN_PENALTY);
                set(flags.jack_bonus, Rules::JACK_BONUS);
                set(flags.no_trick_bonus, Rules::NO_TRICK_BONUS);
                set(flags.must_break_hearts, Rules::MUST_BREAK_HEARTS);
                set(flags.queen_breaks_hearts, Rules::QUEEN_BREAKS_HEARTS);
                set(flags.do_pass_cards, Rules::DO_PASS_CARDS);
                set(flags.no_hearts_first_trick, Rules::NO_HEARTS_FIRST_TRICK);
                set(flags.no_queen_first_trick, Rules::NO_QUEEN_FIRST_TRICK);
                set(flags.lead_clubs, Rules::LEAD_CLUBS);
                set(flags.lead_2_clubs, Rules::LEAD_2_CLUBS);
                rules
            }
        }
    }
}

/// Successful decision reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub status: String,
    #[serde(rename = "move")]
    pub chosen: ChosenMove,
    pub computation_time_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChosenMove {
    pub card: Card,
    pub player: Seat,
}

impl MoveResponse {
    pub fn new(card: Card, player: Seat, computation_time_ms: f64) -> Self {
        Self {
            status: "success".to_string(),
            chosen: ChosenMove { card, player },
            computation_time_ms,
        }
    }
}

/// Error reply with a stable code for transport mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            status: "error".to_string(),
            error_code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

fn seat(player: u8) -> Result<Seat, EngineError> {
    Seat::from_index(player as usize)
        .ok_or_else(|| EngineError::InvalidRequest(format!("player index {player} out of range")))
}

/// Rebuilds the information set by replaying the observed history through
/// the rules engine. Any contradiction surfaces as `InconsistentState`.
pub fn build_state(data: &GameStateData) -> Result<HeartsState, EngineError> {
    if data.current_player != 0 {
        return Err(EngineError::InvalidRequest(format!(
            "the acting player must be 0, got {}",
            data.current_player
        )));
    }
    if data.player_hand.is_empty() || data.player_hand.len() > 13 {
        return Err(EngineError::InvalidRequest(format!(
            "player_hand must hold 1..=13 cards, got {}",
            data.player_hand.len()
        )));
    }
    let rules = data
        .rules
        .as_ref()
        .map(RulesInput::to_rules)
        .unwrap_or(Rules::STANDARD);
    let pass_dir = PassDirection::from_offset(data.pass_direction).ok_or_else(|| {
        EngineError::InvalidRequest(format!(
            "pass_direction {} is not one of -1, 0, 1, 2",
            data.pass_direction
        ))
    })?;

    let mut state = HeartsState::new(rules, pass_dir, 0);
    for &card in &data.player_hand {
        state
            .assign(Seat::North, card)
            .map_err(|_| EngineError::InconsistentState(format!("{card} appears twice in hand")))?;
    }

    for (index, trick) in data.trick_history.iter().enumerate() {
        replay_completed_trick(&mut state, index, trick)?;
    }

    for (player, pile) in data.played_cards.iter().enumerate().take(4) {
        let seat = seat(player as u8)?;
        for &card in pile {
            if state.taken(seat).contains(card) {
                continue;
            }
            state.record_taken(seat, card).map_err(|_| {
                EngineError::InconsistentState(format!(
                    "{card} is listed as won by player {player} but appears elsewhere"
                ))
            })?;
        }
    }

    if let Some(trick) = &data.current_trick {
        if !trick.cards.is_empty() {
            replay_open_trick(&mut state, trick)?;
        }
    }

    if state.current_player() != Seat::North {
        return Err(EngineError::InconsistentState(format!(
            "after replay it is {}'s turn, not player 0's",
            state.current_player()
        )));
    }
    if data.hearts_broken {
        state.force_hearts_broken();
    }
    Ok(state)
}

fn replay_completed_trick(
    state: &mut HeartsState,
    index: usize,
    trick: &CompletedTrickData,
) -> Result<(), EngineError> {
    if trick.cards.len() != 4 {
        return Err(EngineError::InconsistentState(format!(
            "history trick {index} has {} cards, expected 4",
            trick.cards.len()
        )));
    }
    let leader = seat(trick.lead_player)?;
    state.set_lead(leader).map_err(|_| {
        EngineError::InconsistentState(format!("history trick {index} starts mid-trick"))
    })?;
    replay_plays(state, &trick.cards)?;
    let computed = state
        .completed_tricks()
        .last()
        .and_then(|finished| finished.winner());
    let declared = seat(trick.winner)?;
    if computed != Some(declared) {
        return Err(EngineError::InconsistentState(format!(
            "history trick {index} declares winner {}, rules say {}",
            trick.winner,
            computed.map(|s| s.index().to_string()).unwrap_or_default()
        )));
    }
    Ok(())
}

fn replay_open_trick(state: &mut HeartsState, trick: &TrickData) -> Result<(), EngineError> {
    let leader = seat(trick.lead_player)?;
    state
        .set_lead(leader)
        .map_err(|_| EngineError::InconsistentState("open trick starts mid-trick".to_string()))?;
    replay_plays(state, &trick.cards)
}

fn replay_plays(state: &mut HeartsState, plays: &[TrickCardData]) -> Result<(), EngineError> {
    for play in plays {
        let player = seat(play.player)?;
        state.assign(player, play.card).map_err(|_| {
            EngineError::InconsistentState(format!(
                "{} is both in a hand and already played",
                play.card
            ))
        })?;
    }
    for play in plays {
        let player = seat(play.player)?;
        if state.current_player() != player {
            return Err(EngineError::InconsistentState(format!(
                "trick records player {} out of turn",
                play.player
            )));
        }
        state.apply_move(play.card).map_err(|err| {
            EngineError::InconsistentState(format!("replaying {} failed: {err}", play.card))
        })?;
    }
    Ok(())
}
