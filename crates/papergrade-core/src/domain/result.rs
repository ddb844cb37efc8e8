//! Per-evaluator results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Failure reason recorded when an evaluator exceeds its task timeout.
pub const REASON_TIMEOUT: &str = "timeout";
/// Failure reason recorded when evaluator output cannot be parsed.
pub const REASON_UNPARSEABLE: &str = "unparseable";

/// What an evaluator hands back before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Free text, typically an LLM completion.
    Text(String),
    /// Already-structured output.
    Structured(Value),
}

impl From<String> for RawOutput {
    fn from(s: String) -> Self {
        RawOutput::Text(s)
    }
}

impl From<Value> for RawOutput {
    fn from(v: Value) -> Self {
        RawOutput::Structured(v)
    }
}

/// A fully-typed successful evaluation.
///
/// `sub_scores` always carries every sub-criterion key the rubric mandates
/// for the evaluator's kind, each clipped to `[0, 5]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorSuccess {
    pub sub_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    /// Sub-score keys filled with the midpoint because the evaluator omitted them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Tagged union of evaluator outcomes. Never partially typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluatorResult {
    Success(EvaluatorSuccess),
    Failure { reason: String },
}

impl EvaluatorResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        EvaluatorResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::failure(REASON_TIMEOUT)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluatorResult::Success(_))
    }

    pub fn as_success(&self) -> Option<&EvaluatorSuccess> {
        match self {
            EvaluatorResult::Success(s) => Some(s),
            EvaluatorResult::Failure { .. } => None,
        }
    }

    /// Short outcome label for logs.
    pub fn outcome(&self) -> &str {
        match self {
            EvaluatorResult::Success(_) => "success",
            EvaluatorResult::Failure { reason } if reason == REASON_TIMEOUT => "timeout",
            EvaluatorResult::Failure { .. } => "failure",
        }
    }
}
