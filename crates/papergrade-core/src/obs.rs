//! Structured observability hooks for the evaluation lifecycle.
//!
//! This module provides:
//! - Request-scoped tracing spans via the `EvaluationSpan` RAII guard
//! - Emission functions for key lifecycle events: orchestrator resolution,
//!   evaluation start, per-evaluator completion, scoring, run-log failures
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use tracing::info;

use crate::domain::{EvaluatorKind, Grade};

/// The request-scoped span. Attach it to futures with `Instrument::instrument`;
/// an entered guard must not be held across an `.await`.
pub fn evaluation_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("papergrade.evaluation", run_id = %run_id)
}

/// RAII guard that enters a request-scoped span for synchronous work.
///
/// # Example
///
/// ```ignore
/// let _span = EvaluationSpan::enter("5f0c...");
/// // every tracing call is now associated with run_id = "5f0c..."
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        Self::enter_span(evaluation_span(run_id))
    }

    /// Enter an existing span, e.g. one already used to instrument a future.
    pub fn enter_span(span: tracing::Span) -> Self {
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: the orchestrator cascade settled on a strategy (or none).
pub fn emit_orchestrator_resolved(strategy: &str, probed: usize) {
    info!(event = "orchestrator.resolved", strategy = %strategy, probed = probed);
}

/// Emit event: evaluation started for the given kinds.
pub fn emit_evaluation_started(run_id: &str, orchestrator: &str, kinds: &[EvaluatorKind]) {
    let kinds = kinds
        .iter()
        .map(EvaluatorKind::as_str)
        .collect::<Vec<_>>()
        .join(",");
    info!(
        event = "evaluation.started",
        run_id = %run_id,
        orchestrator = %orchestrator,
        kinds = %kinds,
    );
}

/// Emit event: one evaluator finished (successfully or not).
pub fn emit_evaluator_finished(kind: EvaluatorKind, outcome: &str, elapsed_ms: u64) {
    info!(
        event = "evaluator.finished",
        kind = %kind,
        outcome = %outcome,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: composite score computed.
pub fn emit_evaluation_scored(run_id: &str, total: f64, grade: Grade, degraded: usize) {
    info!(
        event = "evaluation.scored",
        run_id = %run_id,
        total = total,
        grade = %grade,
        degraded = degraded,
    );
}

/// Emit event: run log could not be written (warning level).
pub fn emit_run_log_write_error(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run_log.write_error", run_id = %run_id, error = %error);
}
