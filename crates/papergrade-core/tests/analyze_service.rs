//! End-to-end behaviour of the analyze request/response surface.

mod common;

use std::sync::Arc;

use common::{pipeline, uniform_set, FailingEvaluator, SpyEvaluator};
use papergrade_core::{
    AnalysisService, AnalyzeInput, EngineConfig, EvaluatorKind, EvaluatorSet,
    OrchestratorAvailability, RunLog, StaticStrategy, StrategyRegistry,
};
use serde_json::{json, Value};

fn service_with(evaluators: EvaluatorSet) -> AnalysisService {
    let registry = StrategyRegistry::new().register(StaticStrategy::new(
        "test",
        Arc::new(pipeline("test", evaluators)),
    ));
    AnalysisService::new(Arc::new(OrchestratorAvailability::resolve(&registry)))
}

fn unavailable_service() -> AnalysisService {
    AnalysisService::new(Arc::new(OrchestratorAvailability::resolve(
        &StrategyRegistry::new(),
    )))
}

#[tokio::test]
async fn test_blank_text_rejected_before_dispatch() {
    let spy = SpyEvaluator::new(EvaluatorKind::Market);
    let service = service_with(uniform_set(4.0).with(Arc::new(spy.clone())));

    for text in ["", "   \n\t"] {
        let response = service.analyze(AnalyzeInput::new(text)).await;
        assert_eq!(response.status, 400);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("text must not be empty"));
    }
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn test_missing_text_rejected() {
    let service = service_with(uniform_set(4.0));
    let response = service.analyze_json(r#"{"authors": "Ada"}"#).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let service = service_with(uniform_set(4.0));
    let response = service.analyze_json("{not json").await;
    assert_eq!(response.status, 400);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("malformed request body"));
}

#[tokio::test]
async fn test_no_valid_agents_rejected() {
    let service = service_with(uniform_set(4.0));
    let response = service
        .analyze(AnalyzeInput::new("paper").with_agents(["astrology"]))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({"error": "invalid input: no valid agents specified"})
    );
}

#[tokio::test]
async fn test_unavailable_orchestrator_is_500() {
    let response = unavailable_service()
        .analyze(AnalyzeInput::new("a real paper"))
        .await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body, json!({"error": "no orchestrator available"}));
}

#[tokio::test]
async fn test_invalid_input_wins_over_unavailable_orchestrator() {
    let response = unavailable_service().analyze(AnalyzeInput::new(" ")).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_full_response_shape() {
    let service = service_with(uniform_set(5.0));
    let response = service
        .analyze(AnalyzeInput::new("A breakthrough paper").with_authors("Dr. Ada"))
        .await;

    assert_eq!(response.status, 200);
    let body = &response.body;
    for kind in EvaluatorKind::ALL {
        assert_eq!(body[kind.as_str()]["status"], "success", "{kind}");
    }
    assert_eq!(body["comprehensive_score"], 100.0);
    assert_eq!(body["max_score"], 100.0);
    assert_eq!(body["grade"], "A+");
    assert_eq!(
        body["recommendation"],
        "Strong — recommend immediate commercialization"
    );
    assert_eq!(body["orchestrator"], "test");
    assert_eq!(body["category_scores"].as_array().unwrap().len(), 6);
    assert_eq!(body["degraded_categories"], json!([]));
    assert_eq!(body["agents_run"].as_array().unwrap().len(), 6);
    assert!(body["run_id"].as_str().is_some());
    assert!(body["evaluated_at"].as_str().is_some());
}

#[tokio::test]
async fn test_subset_of_agents() {
    let service = service_with(uniform_set(5.0));
    let response = service
        .analyze(AnalyzeInput::new("paper").with_agents(["team", "unknown"]))
        .await;

    assert_eq!(response.status, 200);
    let body = &response.body;
    assert!(body.get("team").is_some());
    assert!(body.get("market").is_none());
    assert_eq!(body["agents_run"], json!(["team"]));
    // Team at full marks, the other 85 points at the midpoint
    assert_eq!(body["comprehensive_score"], 57.5);
    assert_eq!(body["grade"], "B");
    assert_eq!(body["degraded_categories"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_failed_evaluator_reported_but_scored() {
    let service = service_with(uniform_set(5.0).with(Arc::new(FailingEvaluator {
        kind: EvaluatorKind::Impact,
    })));
    let response = service.analyze(AnalyzeInput::new("paper")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["impact"]["status"], "failure");
    assert_eq!(response.body["comprehensive_score"], 95.0);
    assert_eq!(response.body["degraded_categories"], json!(["impact"]));
}

#[tokio::test]
async fn test_authors_list_reaches_team() {
    let spy = SpyEvaluator::new(EvaluatorKind::Team);
    let service = service_with(EvaluatorSet::new().with(Arc::new(spy.clone())));
    let response = service
        .analyze_json(
            r#"{"text": "paper", "authors": ["Ada Lovelace", "Alan Turing"], "agents_to_run": ["team"]}"#,
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(spy.calls()[0].text, "Ada Lovelace\nAlan Turing");
}

#[tokio::test]
async fn test_run_log_written() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(uniform_set(4.0)).with_run_log(RunLog::new(dir.path(), "run"));

    let response = service
        .analyze(AnalyzeInput::new("confidential manuscript text"))
        .await;
    assert_eq!(response.status, 200);

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("run_"));
    assert!(name.ends_with(".json"));

    let content = std::fs::read_to_string(&entries[0]).unwrap();
    assert!(!content.contains("confidential manuscript text"));
    let record: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(record["document_sha256"].as_str().unwrap().len(), 64);
    assert_eq!(record["response"]["run_id"], response.body["run_id"]);
}

#[tokio::test]
async fn test_run_log_failure_does_not_fail_request() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    let service = service_with(uniform_set(4.0)).with_run_log(RunLog::new(&blocker, "run"));

    let response = service.analyze(AnalyzeInput::new("paper")).await;
    assert_eq!(response.status, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_requests_on_spawned_tasks_each_log_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(
        service_with(uniform_set(3.0)).with_run_log(RunLog::new(dir.path().join("runs"), "run")),
    );

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.analyze(AnalyzeInput::new(format!("paper {i}"))).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().status, 200);
    }

    let written = std::fs::read_dir(dir.path().join("runs")).unwrap().count();
    assert_eq!(written, 3);
}

#[tokio::test]
async fn test_heuristic_strategy_end_to_end() {
    let config = EngineConfig {
        strategies: vec!["heuristic".to_string()],
        ..Default::default()
    };
    let service = AnalysisService::from_config(&config);
    assert_eq!(service.availability().strategy(), Some("heuristic"));

    let response = service
        .analyze(
            AnalyzeInput::new(
                "We present a novel, patented membrane for low-cost manufacturing at scale. \
                 A pilot plant validated the prototype; the global market exceeds a billion euro.",
            )
            .with_authors("Prof. Jane Doe, PhD, co-founder of two startups"),
        )
        .await;

    assert_eq!(response.status, 200);
    let score = response.body["comprehensive_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert_eq!(response.body["orchestrator"], "heuristic");
    for kind in EvaluatorKind::ALL {
        assert_eq!(response.body[kind.as_str()]["status"], "success", "{kind}");
    }
}
