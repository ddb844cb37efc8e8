//! The response object returned for one evaluation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{CategoryScore, CompositeScore, EvaluatorKind, EvaluatorResult, Grade};

/// Per-kind results flattened alongside the composite score and run metadata.
///
/// Serialized shape:
/// `{ "<kind>": {...}, ..., "comprehensive_score": 71.3, "grade": "B+", ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    #[serde(flatten)]
    pub results: BTreeMap<EvaluatorKind, EvaluatorResult>,
    pub comprehensive_score: f64,
    pub max_score: f64,
    pub grade: Grade,
    pub recommendation: String,
    pub category_scores: Vec<CategoryScore>,
    pub degraded_categories: Vec<EvaluatorKind>,
    pub orchestrator: String,
    pub agents_run: Vec<EvaluatorKind>,
    pub run_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResponse {
    pub fn new(
        run_id: Uuid,
        orchestrator: impl Into<String>,
        results: BTreeMap<EvaluatorKind, EvaluatorResult>,
        score: CompositeScore,
        max_score: f64,
    ) -> Self {
        let degraded_categories = score.degraded_categories();
        Self {
            agents_run: results.keys().copied().collect(),
            results,
            comprehensive_score: score.total,
            max_score,
            grade: score.grade,
            recommendation: score.recommendation,
            category_scores: score.category_scores,
            degraded_categories,
            orchestrator: orchestrator.into(),
            run_id,
            evaluated_at: Utc::now(),
        }
    }
}
