//! Core domain types: requests, evaluator results, and aggregated scores.

pub mod error;
pub mod kind;
pub mod request;
pub mod result;
pub mod score;

pub use error::{EvalError, Result, RubricError};
pub use kind::{EvaluatorKind, UnknownKind};
pub use request::{AnalyzeInput, Authors, EvaluationRequest};
pub use result::{EvaluatorResult, EvaluatorSuccess, RawOutput, REASON_TIMEOUT, REASON_UNPARSEABLE};
pub use score::{CategoryScore, CompositeScore, Grade, SubScore};
