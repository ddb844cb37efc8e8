//! Named strategies in the orchestrator cascade.
//!
//! A strategy answers two questions: can it run here (`probe`), and if so,
//! give me an orchestrator (`build`). Probing must be cheap and must not
//! perform network calls.

use std::sync::Arc;

use super::{EvaluationPipeline, Orchestrator};
use crate::config::{EngineConfig, LlmConfig};
use crate::domain::{EvalError, EvaluatorKind, Result};
use crate::evaluator::{EvaluatorSet, HeuristicEvaluator, KeywordProfiles, LlmClient, LlmEvaluator};
use crate::executor::{ConcurrentExecutor, ExecutorConfig};
use crate::normalizer::{Normalizer, ReadinessScale};
use crate::rubric::Rubric;
use crate::scorer::Scorer;

pub trait OrchestratorStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the strategy's collaborators are usable in this process.
    fn probe(&self) -> bool;

    fn build(&self) -> Result<Arc<dyn Orchestrator>>;
}

/// Settings shared by every pipeline-backed strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub executor: ExecutorConfig,
    pub readiness: ReadinessScale,
}

impl PipelineSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            executor: config.executor.clone(),
            readiness: config.scoring.readiness_scale,
        }
    }

    /// Wrap `evaluators` in an executor and scorer over the standard rubric.
    pub fn pipeline(&self, name: &str, evaluators: EvaluatorSet) -> EvaluationPipeline {
        let normalizer = Normalizer::new(Rubric::standard(), self.readiness);
        let executor = ConcurrentExecutor::new(evaluators, normalizer, &self.executor);
        EvaluationPipeline::new(name, executor, Scorer::standard())
    }
}

/// Model-backed evaluators for every kind.
#[derive(Debug, Clone)]
pub struct LlmStrategy {
    llm: LlmConfig,
    settings: PipelineSettings,
}

impl LlmStrategy {
    pub const NAME: &'static str = "llm";

    pub fn new(llm: LlmConfig, settings: PipelineSettings) -> Self {
        Self { llm, settings }
    }
}

impl OrchestratorStrategy for LlmStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn probe(&self) -> bool {
        self.llm.has_api_key() && LlmClient::new(&self.llm).is_ok()
    }

    fn build(&self) -> Result<Arc<dyn Orchestrator>> {
        let client = LlmClient::new(&self.llm)
            .map(Arc::new)
            .map_err(|e| EvalError::Config(e.to_string()))?;

        let evaluators = EvaluatorKind::ALL
            .into_iter()
            .fold(EvaluatorSet::new(), |set, kind| {
                set.with(Arc::new(LlmEvaluator::new(
                    kind,
                    Arc::clone(&client),
                    self.llm.max_input_chars,
                )))
            });

        Ok(Arc::new(self.settings.pipeline(Self::NAME, evaluators)))
    }
}

/// Deterministic keyword evaluators; needs nothing but compiled regexes.
#[derive(Debug, Clone)]
pub struct HeuristicStrategy {
    settings: PipelineSettings,
}

impl HeuristicStrategy {
    pub const NAME: &'static str = "heuristic";

    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }
}

impl OrchestratorStrategy for HeuristicStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn probe(&self) -> bool {
        KeywordProfiles::compile().is_ok()
    }

    fn build(&self) -> Result<Arc<dyn Orchestrator>> {
        let profiles = KeywordProfiles::compile()
            .map(Arc::new)
            .map_err(|e| EvalError::Config(format!("keyword profiles: {e}")))?;

        let evaluators = EvaluatorKind::ALL
            .into_iter()
            .fold(EvaluatorSet::new(), |set, kind| {
                set.with(Arc::new(HeuristicEvaluator::new(kind, Arc::clone(&profiles))))
            });

        Ok(Arc::new(self.settings.pipeline(Self::NAME, evaluators)))
    }
}

/// A prebuilt orchestrator that always probes available.
///
/// For embedding callers that wire their own evaluators.
#[derive(Clone)]
pub struct StaticStrategy {
    name: String,
    orchestrator: Arc<dyn Orchestrator>,
}

impl StaticStrategy {
    pub fn new(name: impl Into<String>, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            name: name.into(),
            orchestrator,
        }
    }
}

impl OrchestratorStrategy for StaticStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> bool {
        true
    }

    fn build(&self) -> Result<Arc<dyn Orchestrator>> {
        Ok(Arc::clone(&self.orchestrator))
    }
}
