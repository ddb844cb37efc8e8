//! The evaluator capability interface and its implementations.
//!
//! An [`Evaluator`] scores one rubric facet. It returns raw output (free text
//! or structured JSON) which the [`Normalizer`](crate::normalizer::Normalizer)
//! turns into a typed result. Any error it returns is contained by the
//! executor and recorded as a failure for that kind only.

pub mod error;
pub mod heuristic;
pub mod llm;
pub mod unavailable;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{EvaluationRequest, EvaluatorKind, RawOutput};

pub use error::EvaluatorError;
pub use heuristic::{HeuristicEvaluator, KeywordProfiles};
pub use llm::{LlmClient, LlmEvaluator};
pub use unavailable::UnavailableEvaluator;

/// The slice of a request handed to one evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorInput {
    /// Primary text to score.
    pub text: String,
    /// Supporting material, e.g. the paper itself when `text` is author metadata.
    pub context: Option<String>,
}

impl EvaluatorInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }
}

/// Pick the input for `kind`.
///
/// Team is the one evaluator with its own rule: it scores the author text when
/// present and falls back to the document otherwise. When it gets author text,
/// the document rides along as context.
pub fn select_input(kind: EvaluatorKind, request: &EvaluationRequest) -> EvaluatorInput {
    match (kind, request.author_text()) {
        (EvaluatorKind::Team, Some(authors)) => EvaluatorInput {
            text: authors.to_string(),
            context: Some(request.document_text().to_string()),
        },
        _ => EvaluatorInput::new(request.document_text()),
    }
}

/// Scores one rubric facet.
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn kind(&self) -> EvaluatorKind;

    async fn evaluate(&self, input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError>;
}

/// Evaluators keyed by kind. Kinds without an entry resolve to
/// [`UnavailableEvaluator`].
#[derive(Clone, Default)]
pub struct EvaluatorSet {
    evaluators: BTreeMap<EvaluatorKind, Arc<dyn Evaluator>>,
}

impl EvaluatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evaluator under its own kind, replacing any previous one.
    pub fn with(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.insert(evaluator);
        self
    }

    pub fn insert(&mut self, evaluator: Arc<dyn Evaluator>) {
        self.evaluators.insert(evaluator.kind(), evaluator);
    }

    pub fn get(&self, kind: EvaluatorKind) -> Arc<dyn Evaluator> {
        self.evaluators
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(UnavailableEvaluator::new(kind)))
    }

    pub fn contains(&self, kind: EvaluatorKind) -> bool {
        self.evaluators.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EvaluatorKind> + '_ {
        self.evaluators.keys().copied()
    }
}

impl std::fmt::Debug for EvaluatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorSet")
            .field("kinds", &self.evaluators.keys().collect::<Vec<_>>())
            .finish()
    }
}
