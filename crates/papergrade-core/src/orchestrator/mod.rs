//! Orchestration strategies and the startup cascade that picks one.
//!
//! An [`Orchestrator`] turns an [`EvaluationRequest`] into per-kind results
//! plus a composite score. Which orchestrator serves requests is decided
//! once, at startup, by [`OrchestratorAvailability::resolve`] walking a
//! [`StrategyRegistry`] from the richest strategy to the simplest.

pub mod pipeline;
pub mod selector;
pub mod strategy;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{CompositeScore, EvalError, EvaluationRequest, EvaluatorKind, EvaluatorResult, Result};
use crate::rubric::MAX_TOTAL;

pub use pipeline::EvaluationPipeline;
pub use selector::{OrchestratorAvailability, ProbeRecord, StrategyRegistry};
pub use strategy::{
    HeuristicStrategy, LlmStrategy, OrchestratorStrategy, PipelineSettings, StaticStrategy,
};

/// Name reported when no strategy initialised.
pub const NO_ORCHESTRATOR: &str = "none";

/// Output of one orchestrated evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub results: BTreeMap<EvaluatorKind, EvaluatorResult>,
    pub score: CompositeScore,
}

/// Uniform entry point over every orchestration strategy.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation>;

    /// Points available in the composite score.
    fn max_score(&self) -> f64 {
        MAX_TOTAL
    }
}

/// Answers every request with [`EvalError::OrchestratorUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOrchestrator;

#[async_trait]
impl Orchestrator for UnavailableOrchestrator {
    fn name(&self) -> &str {
        NO_ORCHESTRATOR
    }

    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<Evaluation> {
        Err(EvalError::OrchestratorUnavailable)
    }
}
