pub mod card;
pub mod cardset;
pub mod deck;
pub mod pass;
pub mod rank;
pub mod rules;
pub mod seat;
pub mod state;
pub mod suit;
pub mod trick;
