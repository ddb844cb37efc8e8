//! papergrade core library
//!
//! Rubric-driven evaluation of research papers: fans a document out to six
//! independent evaluators under bounded parallelism, normalizes whatever
//! they return, and folds the results into a 100-point composite score with
//! a grade and recommendation.

pub mod config;
pub mod domain;
pub mod evaluator;
pub mod executor;
pub mod normalizer;
pub mod obs;
pub mod orchestrator;
pub mod response;
pub mod rubric;
pub mod run_log;
pub mod scorer;
pub mod service;
pub mod telemetry;

pub use config::{EngineConfig, LlmConfig, ScoringConfig};

pub use domain::{
    AnalyzeInput, Authors, CategoryScore, CompositeScore, EvalError, EvaluationRequest,
    EvaluatorKind, EvaluatorResult, EvaluatorSuccess, Grade, RawOutput, Result, RubricError,
    SubScore, REASON_TIMEOUT, REASON_UNPARSEABLE,
};

pub use evaluator::{
    select_input, Evaluator, EvaluatorError, EvaluatorInput, EvaluatorSet, HeuristicEvaluator,
    KeywordProfiles, LlmClient, LlmEvaluator, UnavailableEvaluator,
};

pub use executor::{ConcurrentExecutor, ExecutorConfig};
pub use normalizer::{Normalizer, ReadinessScale};
pub use obs::{
    emit_evaluation_scored, emit_evaluation_started, emit_evaluator_finished,
    emit_orchestrator_resolved, emit_run_log_write_error, EvaluationSpan,
};
pub use orchestrator::{
    Evaluation, EvaluationPipeline, HeuristicStrategy, LlmStrategy, Orchestrator,
    OrchestratorAvailability, OrchestratorStrategy, PipelineSettings, ProbeRecord,
    StaticStrategy, StrategyRegistry, UnavailableOrchestrator,
};
pub use response::EvaluationResponse;
pub use rubric::{grade_for, Rubric, MAX_TOTAL, MIDPOINT};
pub use run_log::{RunLog, RunLogConfig};
pub use scorer::Scorer;
pub use service::{AnalysisService, ApiResponse};
pub use telemetry::init_tracing;
