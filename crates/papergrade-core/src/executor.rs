//! Bounded fan-out / fan-in over evaluators.
//!
//! One task is spawned per requested kind, gated by a semaphore sized
//! `min(kinds, max_concurrency)`. Each task normalizes its own output; the
//! timeout is enforced on the task's join handle from the fan-in side, so an
//! evaluator that blocks its thread still times out and is aborted.
//! Results are keyed by kind, never by completion order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{instrument, warn, Instrument};

use crate::domain::{EvalError, EvaluationRequest, EvaluatorKind, EvaluatorResult};
use crate::evaluator::{select_input, EvaluatorSet};
use crate::normalizer::Normalizer;
use crate::obs;

/// Upper bound on concurrently running evaluators.
pub const DEFAULT_MAX_CONCURRENCY: usize = 6;
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 120;

/// Configuration for a fan-out batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Cap on concurrent evaluator tasks.
    pub max_concurrency: usize,
    /// Per-task timeout, measured from when the task gets its permit.
    pub task_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
        }
    }
}

impl ExecutorConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if self.max_concurrency == 0 {
            return Err(EvalError::Config(
                "executor.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.task_timeout_secs == 0 {
            return Err(EvalError::Config(
                "executor.task_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs a set of evaluators for one request.
#[derive(Debug, Clone)]
pub struct ConcurrentExecutor {
    evaluators: EvaluatorSet,
    normalizer: Arc<Normalizer>,
    max_concurrency: usize,
    task_timeout: Duration,
}

impl ConcurrentExecutor {
    pub fn new(evaluators: EvaluatorSet, normalizer: Normalizer, config: &ExecutorConfig) -> Self {
        Self {
            evaluators,
            normalizer: Arc::new(normalizer),
            max_concurrency: config.max_concurrency.max(1),
            task_timeout: config.task_timeout(),
        }
    }

    /// Override the per-task timeout (sub-second values are handy in tests).
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn evaluators(&self) -> &EvaluatorSet {
        &self.evaluators
    }

    /// Fan `request` out to every kind in `kinds` and collect one result per kind.
    ///
    /// Never fails: timeouts, evaluator errors, unparseable output and panics
    /// all become `EvaluatorResult::Failure` for that kind only.
    #[instrument(skip_all, fields(kinds = kinds.len()))]
    pub async fn run(
        &self,
        kinds: &BTreeSet<EvaluatorKind>,
        request: &EvaluationRequest,
    ) -> BTreeMap<EvaluatorKind, EvaluatorResult> {
        if kinds.is_empty() {
            return BTreeMap::new();
        }

        // Semaphore bounds concurrency for this request only.
        let sem = Arc::new(Semaphore::new(kinds.len().min(self.max_concurrency)));

        let tasks = kinds.iter().map(|&kind| {
            let evaluator = self.evaluators.get(kind);
            let normalizer = Arc::clone(&self.normalizer);
            let input = select_input(kind, request);
            let timeout = self.task_timeout;
            let sem = Arc::clone(&sem);

            async move {
                // Held outside the task: a timed-out slot frees even if the evaluator never yields.
                let _permit = sem.acquire_owned().await.ok();
                let started = Instant::now();

                let mut handle = tokio::spawn(
                    async move {
                        match evaluator.evaluate(&input).await {
                            Ok(raw) => normalizer.normalize(kind, &raw),
                            Err(e) => {
                                warn!(kind = %kind, error = %e, "evaluator failed");
                                EvaluatorResult::failure(e.to_string())
                            }
                        }
                    }
                    .in_current_span(),
                );

                let result = match tokio::time::timeout(timeout, &mut handle).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        let reason = if e.is_panic() {
                            format!("evaluator panicked: {}", panic_message(e.into_panic()))
                        } else {
                            "evaluator task cancelled".to_string()
                        };
                        warn!(kind = %kind, reason = %reason, "evaluator task aborted");
                        EvaluatorResult::failure(reason)
                    }
                    Err(_) => {
                        handle.abort();
                        warn!(kind = %kind, timeout_ms = timeout.as_millis() as u64, "evaluator timed out");
                        EvaluatorResult::timeout()
                    }
                };

                obs::emit_evaluator_finished(
                    kind,
                    result.outcome(),
                    started.elapsed().as_millis() as u64,
                );
                (kind, result)
            }
        });

        join_all(tasks).await.into_iter().collect()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
