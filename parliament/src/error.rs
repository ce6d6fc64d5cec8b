//! Session-fatal error tier.
//!
//! Generation failures never show up here: they degrade to default
//! turns, ballots, and consensus signals at the call site. Only storage
//! failures and unknown idea ids abort an evaluation, and even those are
//! folded into an error-shaped `DebateResult` before reaching the caller.

use crate::debate::state::TransitionError;
use crate::repository::RepositoryError;

/// Error type for a whole-evaluation failure.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Unknown idea: {0}")]
    UnknownIdea(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Session state error: {0}")]
    Transition(#[from] TransitionError),
}

/// Result type for evaluation-level operations.
pub type EvaluationResult<T> = Result<T, EvaluationError>;
