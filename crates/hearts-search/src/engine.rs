use crate::ensemble::PimcEnsemble;
use crate::error::EngineError;
use crate::pool::WorkerPool;
use crate::protocol::{build_state, ErrorResponse, MoveRequest, MoveResponse};
use hearts_core::model::seat::Seat;
use std::time::Instant;
use tracing::{debug, info};

/// Request-level entry point: owns the worker pool and turns one observed
/// game state into one chosen card.
pub struct DecisionEngine {
    pool: WorkerPool,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self {
            pool: WorkerPool::with_available_parallelism(),
        }
    }

    /// Mostly for tests: a single-threaded pool makes decisions fully
    /// reproducible for a fixed seed.
    pub fn with_pool(pool: WorkerPool) -> Self {
        Self { pool }
    }

    pub fn choose_move(&self, request: &MoveRequest) -> Result<MoveResponse, EngineError> {
        let started = Instant::now();
        request.ai_config.validate()?;
        let state = build_state(&request.game_state)?;
        debug!(
            hand = %state.hand(Seat::North),
            trick_index = state.current_trick_index(),
            rules = %state.rules(),
            scores = ?request.game_state.scores,
            "decision request"
        );

        let master_seed = request.ai_config.seed.unwrap_or_else(rand::random);
        let ensemble = PimcEnsemble::new(request.ai_config.clone());
        let decision = ensemble.choose_move(&state, Seat::North, Some(&self.pool), master_seed)?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            card = %decision.card,
            elapsed_ms,
            worlds = decision.worlds_used,
            "decision complete"
        );
        Ok(MoveResponse::new(decision.card, Seat::North, elapsed_ms))
    }

    /// Convenience for transport layers: JSON in, JSON out, errors encoded
    /// as the error response shape.
    pub fn handle_json(&self, body: &str) -> String {
        let reply = match serde_json::from_str::<MoveRequest>(body) {
            Ok(request) => match self.choose_move(&request) {
                Ok(response) => serde_json::to_value(&response),
                Err(error) => serde_json::to_value(ErrorResponse::from_error(&error)),
            },
            Err(parse_error) => serde_json::to_value(ErrorResponse::from_error(
                &EngineError::InvalidRequest(parse_error.to_string()),
            )),
        };
        reply
            .map(|value| value.to_string())
            .unwrap_or_else(|_| r#"{"status":"error","error_code":"INTERNAL_ERROR","message":"failed to serialize response"}"#.to_string())
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}
