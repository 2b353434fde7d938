use thiserror::Error;

/// Engine-level error taxonomy. Each kind maps onto a stable wire code so a
/// transport front-end can translate without string matching.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("inconsistent game state: {0}")]
    InconsistentState(String),

    #[error("no legal moves available in this game state")]
    NoLegalMoves,

    #[error("world sampling failed after {attempts} attempts (voids: {voids})")]
    SamplerFailure { attempts: usize, voids: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidRequest(_) => "INVALID_REQUEST",
            EngineError::InconsistentState(_) => "INCONSISTENT_STATE",
            EngineError::NoLegalMoves => "NO_LEGAL_MOVES",
            EngineError::SamplerFailure { .. } => "SAMPLER_FAILURE",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
