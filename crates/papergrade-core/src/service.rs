//! Request/response surface: validation, orchestration, run logging.
//!
//! Transport-agnostic. [`ApiResponse`] carries an HTTP-style status and a
//! JSON body so any front end (CLI, HTTP server) can relay it unchanged.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{AnalyzeInput, EvalError, EvaluationRequest, Result};
use crate::obs;
use crate::orchestrator::{OrchestratorAvailability, StrategyRegistry};
use crate::response::EvaluationResponse;
use crate::run_log::RunLog;

/// Status plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(err: &EvalError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "error": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Serves evaluation requests against the resolved orchestrator.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    availability: Arc<OrchestratorAvailability>,
    run_log: Option<RunLog>,
}

impl AnalysisService {
    pub fn new(availability: Arc<OrchestratorAvailability>) -> Self {
        Self {
            availability,
            run_log: None,
        }
    }

    /// Resolve the orchestrator cascade from `config` and enable the run log
    /// if configured.
    pub fn from_config(config: &EngineConfig) -> Self {
        let registry = StrategyRegistry::from_config(config);
        let availability = Arc::new(OrchestratorAvailability::resolve(&registry));
        let service = Self::new(availability);
        match RunLog::from_config(&config.run_log) {
            Some(log) => service.with_run_log(log),
            None => service,
        }
    }

    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn availability(&self) -> &OrchestratorAvailability {
        &self.availability
    }

    /// Evaluate a validated request.
    ///
    /// Fails only when no orchestrator is available; evaluator failures are
    /// reported inside the response.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse> {
        let orchestrator = self.availability.active();
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let span = obs::evaluation_span(&run_id_str);

        async {
            let kinds: Vec<_> = request.requested().iter().copied().collect();
            obs::emit_evaluation_started(&run_id_str, orchestrator.name(), &kinds);
            let evaluation = orchestrator.evaluate(request).await?;

            let response = EvaluationResponse::new(
                run_id,
                orchestrator.name(),
                evaluation.results,
                evaluation.score,
                orchestrator.max_score(),
            );
            obs::emit_evaluation_scored(
                &run_id_str,
                response.comprehensive_score,
                response.grade,
                response.degraded_categories.len(),
            );

            if let Some(log) = &self.run_log {
                let recorded = log
                    .record(
                        &response,
                        request.document_text(),
                        request.author_text().is_some(),
                    )
                    .await;
                if let Err(e) = recorded {
                    obs::emit_run_log_write_error(&run_id_str, &format!("{e:#}"));
                }
            }

            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Validate wire input and evaluate it. 400 for bad input, 500 when no
    /// orchestrator is available.
    pub async fn analyze(&self, input: AnalyzeInput) -> ApiResponse {
        let request = match input.into_request() {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "rejected request");
                return ApiResponse::error(&e);
            }
        };

        match self.evaluate(&request).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(body) => ApiResponse::ok(body),
                Err(e) => ApiResponse::error(&EvalError::Serialization(e)),
            },
            Err(e) => {
                warn!(error = %e, "evaluation failed");
                ApiResponse::error(&e)
            }
        }
    }

    /// Like [`analyze`](Self::analyze) but from a raw JSON body.
    pub async fn analyze_json(&self, body: &str) -> ApiResponse {
        match serde_json::from_str::<AnalyzeInput>(body) {
            Ok(input) => self.analyze(input).await,
            Err(e) => ApiResponse::error(&EvalError::InvalidInput(format!(
                "malformed request body: {e}"
            ))),
        }
    }
}
