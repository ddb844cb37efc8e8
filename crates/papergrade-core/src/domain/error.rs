//! Domain-level error taxonomy for papergrade.

/// Violations of the rubric invariants (weights, fractions, coverage).
#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("category weights sum to {actual}, expected 100")]
    WeightSum { actual: f64 },

    #[error("sub-criterion fractions of {category} sum to {actual}, expected 1.0")]
    FractionSum { category: String, actual: f64 },

    #[error("no rubric category covers evaluator kind {kind}")]
    MissingKind { kind: String },

    #[error("evaluator kind {kind} is covered by more than one category")]
    DuplicateKind { kind: String },

    #[error("category {category} has no sub-criteria")]
    EmptyCategory { category: String },
}

/// papergrade domain errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no orchestrator available")]
    OrchestratorUnavailable,

    #[error("aggregation error: {0}")]
    Aggregation(#[from] RubricError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvalError {
    /// HTTP-style status for the request/response surface.
    pub fn status_code(&self) -> u16 {
        match self {
            EvalError::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

/// Result type for papergrade domain operations.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::InvalidInput("text must not be empty".to_string());
        assert!(err.to_string().contains("invalid input"));

        let err = EvalError::OrchestratorUnavailable;
        assert_eq!(err.to_string(), "no orchestrator available");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(EvalError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(EvalError::OrchestratorUnavailable.status_code(), 500);
        assert_eq!(EvalError::Config("bad".into()).status_code(), 500);
        let rubric = RubricError::WeightSum { actual: 90.0 };
        assert_eq!(EvalError::from(rubric).status_code(), 500);
    }

    #[test]
    fn test_rubric_error_mentions_category() {
        let err = RubricError::FractionSum {
            category: "Team & Founding".to_string(),
            actual: 0.9,
        };
        let msg = err.to_string();
        assert!(msg.contains("Team & Founding"));
        assert!(msg.contains("0.9"));
    }
}
