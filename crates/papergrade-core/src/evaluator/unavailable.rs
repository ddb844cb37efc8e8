//! The no-op evaluator.

use async_trait::async_trait;

use super::{Evaluator, EvaluatorError, EvaluatorInput};
use crate::domain::{EvaluatorKind, RawOutput};

/// Always fails. Stands in for kinds with no implementation so the
/// category degrades to midpoint defaults instead of vanishing.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableEvaluator {
    kind: EvaluatorKind,
}

impl UnavailableEvaluator {
    pub fn new(kind: EvaluatorKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Evaluator for UnavailableEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        Err(EvaluatorError::Unavailable(self.kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_fails() {
        let e = UnavailableEvaluator::new(EvaluatorKind::Impact);
        let err = e.evaluate(&EvaluatorInput::new("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "evaluator not available: impact");
    }
}
