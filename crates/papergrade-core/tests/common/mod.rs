//! Hand-written fake evaluators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use papergrade_core::{
    ConcurrentExecutor, EvaluationPipeline, Evaluator, EvaluatorError, EvaluatorInput,
    EvaluatorKind, EvaluatorSet, ExecutorConfig, Normalizer, RawOutput, Rubric, Scorer,
};
use serde_json::{Map, Value};

/// Structured output giving every rubric sub-criterion of `kind` the score `raw`.
pub fn uniform_output(kind: EvaluatorKind, raw: f64) -> RawOutput {
    let map: Map<String, Value> = Rubric::standard()
        .criteria_for(kind)
        .iter()
        .map(|c| (c.key.to_string(), Value::from(raw)))
        .collect();
    RawOutput::Structured(Value::Object(map))
}

/// Returns canned output.
pub struct FixedEvaluator {
    pub kind: EvaluatorKind,
    pub output: RawOutput,
}

impl FixedEvaluator {
    pub fn uniform(kind: EvaluatorKind, raw: f64) -> Arc<dyn Evaluator> {
        Arc::new(Self {
            kind,
            output: uniform_output(kind, raw),
        })
    }

    pub fn text(kind: EvaluatorKind, text: &str) -> Arc<dyn Evaluator> {
        Arc::new(Self {
            kind,
            output: RawOutput::Text(text.to_string()),
        })
    }
}

#[async_trait]
impl Evaluator for FixedEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        Ok(self.output.clone())
    }
}

/// Always returns an error.
pub struct FailingEvaluator {
    pub kind: EvaluatorKind,
}

#[async_trait]
impl Evaluator for FailingEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        Err(EvaluatorError::Transport("connection refused".to_string()))
    }
}

/// Panics inside the task.
pub struct PanickingEvaluator {
    pub kind: EvaluatorKind,
}

#[async_trait]
impl Evaluator for PanickingEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        panic!("boom");
    }
}

/// Sleeps before answering with uniform 5.0 scores.
pub struct SlowEvaluator {
    pub kind: EvaluatorKind,
    pub delay: Duration,
}

#[async_trait]
impl Evaluator for SlowEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        tokio::time::sleep(self.delay).await;
        Ok(uniform_output(self.kind, 5.0))
    }
}

/// Blocks its worker thread instead of yielding.
pub struct BlockingEvaluator {
    pub kind: EvaluatorKind,
    pub delay: Duration,
}

#[async_trait]
impl Evaluator for BlockingEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        std::thread::sleep(self.delay);
        Ok(uniform_output(self.kind, 5.0))
    }
}

/// Records every input it receives.
#[derive(Clone)]
pub struct SpyEvaluator {
    pub kind: EvaluatorKind,
    pub seen: Arc<Mutex<Vec<EvaluatorInput>>>,
}

impl SpyEvaluator {
    pub fn new(kind: EvaluatorKind) -> Self {
        Self {
            kind,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<EvaluatorInput> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for SpyEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        self.seen.lock().unwrap().push(input.clone());
        Ok(uniform_output(self.kind, 3.0))
    }
}

/// Tracks how many instances run at once.
pub struct TrackingEvaluator {
    pub kind: EvaluatorKind,
    pub delay: Duration,
    pub current: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

#[async_trait]
impl Evaluator for TrackingEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, _input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(uniform_output(self.kind, 4.0))
    }
}

/// Every kind answering with uniform `raw` scores.
pub fn uniform_set(raw: f64) -> EvaluatorSet {
    EvaluatorKind::ALL
        .into_iter()
        .fold(EvaluatorSet::new(), |set, kind| {
            set.with(FixedEvaluator::uniform(kind, raw))
        })
}

pub fn executor(evaluators: EvaluatorSet, config: &ExecutorConfig) -> ConcurrentExecutor {
    ConcurrentExecutor::new(evaluators, Normalizer::default(), config)
}

pub fn pipeline(name: &str, evaluators: EvaluatorSet) -> EvaluationPipeline {
    EvaluationPipeline::new(
        name,
        executor(evaluators, &ExecutorConfig::default()),
        Scorer::standard(),
    )
}
