//! Executor followed by scorer: the orchestrator every real strategy builds.

use async_trait::async_trait;
use tracing::instrument;

use super::{Evaluation, Orchestrator};
use crate::domain::{EvaluationRequest, Result};
use crate::executor::ConcurrentExecutor;
use crate::scorer::Scorer;

#[derive(Debug, Clone)]
pub struct EvaluationPipeline {
    name: String,
    executor: ConcurrentExecutor,
    scorer: Scorer,
}

impl EvaluationPipeline {
    pub fn new(name: impl Into<String>, executor: ConcurrentExecutor, scorer: Scorer) -> Self {
        Self {
            name: name.into(),
            executor,
            scorer,
        }
    }

    pub fn executor(&self) -> &ConcurrentExecutor {
        &self.executor
    }
}

#[async_trait]
impl Orchestrator for EvaluationPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(orchestrator = %self.name))]
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation> {
        let results = self.executor.run(request.requested(), request).await;
        let score = self.scorer.score(&results);
        Ok(Evaluation { results, score })
    }

    fn max_score(&self) -> f64 {
        self.scorer.rubric().max_score()
    }
}
