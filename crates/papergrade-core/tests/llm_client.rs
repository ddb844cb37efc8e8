//! Model-backed evaluator against a local one-shot HTTP server.

use std::sync::Arc;

use papergrade_core::{
    Evaluator, EvaluatorError, EvaluatorInput, EvaluatorKind, EvaluatorResult, LlmClient,
    LlmConfig, LlmEvaluator, Normalizer, RawOutput,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Accept one connection, answer it with `status` and `body`, and return
/// the raw request text (lowercased).
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_lowercase()
    });

    (format!("http://{addr}"), handle)
}

fn config(base_url: String) -> LlmConfig {
    LlmConfig {
        api_key: Some("sk-test".to_string()),
        base_url,
        model: "test-model".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_completion_text_flows_through_normalizer() {
    let reply = json!({
        "content": [{
            "type": "text",
            "text": "Sure.\n{\"customer_clarity_score\": 4, \"tam_eu_score\": 5, \"competition_score\": 2, \"evidence\": [\"EU grid operators\"]}"
        }]
    });
    let (base_url, server) = serve_once("200 OK", reply.to_string()).await;

    let client = Arc::new(LlmClient::new(&config(base_url)).unwrap());
    let evaluator = LlmEvaluator::new(EvaluatorKind::Market, client, 1_000);
    let raw = evaluator
        .evaluate(&EvaluatorInput::new("Smart grid storage paper"))
        .await
        .unwrap();
    assert!(matches!(raw, RawOutput::Text(_)));

    let request = server.await.unwrap();
    assert!(request.starts_with("post /v1/messages"));
    assert!(request.contains("x-api-key: sk-test"));
    assert!(request.contains("anthropic-version: 2023-06-01"));
    assert!(request.contains("test-model"));
    assert!(request.contains("smart grid storage paper"));

    let result = Normalizer::default().normalize(EvaluatorKind::Market, &raw);
    let EvaluatorResult::Success(success) = result else {
        panic!("expected success");
    };
    assert_eq!(success.sub_scores["tam_fit"], 5.0);
    assert_eq!(success.evidence, vec!["EU grid operators".to_string()]);
}

#[tokio::test]
async fn test_upstream_error_status_surfaces() {
    let (base_url, server) =
        serve_once("529 Site Overloaded", json!({"error": "overloaded"}).to_string()).await;

    let client = LlmClient::new(&config(base_url)).unwrap();
    let err = client.complete("system", "prompt").await.unwrap_err();
    match err {
        EvaluatorError::Upstream { status, body } => {
            assert_eq!(status, 529);
            assert!(body.contains("overloaded"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_empty_completion_is_malformed() {
    let (base_url, server) = serve_once("200 OK", json!({"content": []}).to_string()).await;

    let client = LlmClient::new(&config(base_url)).unwrap();
    let err = client.complete("system", "prompt").await.unwrap_err();
    assert!(matches!(err, EvaluatorError::MalformedResponse(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = LlmClient::new(&config(format!("http://{addr}"))).unwrap();
    let err = client.complete("system", "prompt").await.unwrap_err();
    assert!(matches!(err, EvaluatorError::Transport(_)));
}
