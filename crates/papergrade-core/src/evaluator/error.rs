//! Errors raised inside an evaluator.
//!
//! These never cross the executor boundary: the executor converts each one
//! into `EvaluatorResult::Failure { reason }`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluatorError {
    /// Network or transport failure talking to an upstream service
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Upstream answered but the envelope was not what we expected
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// No implementation is wired up for this evaluator
    #[error("evaluator not available: {0}")]
    Unavailable(String),

    #[error("internal evaluator error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for EvaluatorError {
    fn from(err: reqwest::Error) -> Self {
        EvaluatorError::Transport(err.to_string())
    }
}
