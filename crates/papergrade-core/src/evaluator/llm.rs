//! Model-backed evaluators talking to an Anthropic Messages-compatible API.
//!
//! Each evaluator sends a rubric prompt and returns the completion text
//! untouched; extracting the JSON object is the normalizer's job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Evaluator, EvaluatorError, EvaluatorInput};
use crate::config::LlmConfig;
use crate::domain::{EvaluatorKind, RawOutput};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ERROR_BODY_LIMIT: usize = 500;

const SYSTEM_PROMPT: &str = "You are an analyst assessing research papers for their \
commercialization potential. Score every criterion from 0 to 5. Reply with a single JSON \
object and nothing else.";

/// Thin client for the `/v1/messages` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    /// Build a client. Fails when no API key is configured or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self, EvaluatorError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EvaluatorError::Unavailable("no API key configured".to_string()))?
            .to_string();

        let http = reqwest::Client::builder()
            .user_agent(concat!("papergrade/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EvaluatorError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user turn and return the concatenated text blocks of the reply.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, EvaluatorError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::Upstream {
                status: status.as_u16(),
                body: truncate_chars(&text, ERROR_BODY_LIMIT).to_string(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EvaluatorError::MalformedResponse(e.to_string()))?;
        parse_messages_response(&payload)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Extract the text of a Messages API reply.
pub fn parse_messages_response(payload: &Value) -> Result<String, EvaluatorError> {
    let parsed = MessagesResponse::deserialize(payload)
        .map_err(|e| EvaluatorError::MalformedResponse(e.to_string()))?;
    let text = parsed
        .content
        .into_iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(EvaluatorError::MalformedResponse(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}

/// Longest prefix of `s` with at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn instructions(kind: EvaluatorKind) -> &'static str {
    match kind {
        EvaluatorKind::TechIp => {
            "Assess TECHNOLOGY & IP.\n\
             - novelty_score: how novel or breakthrough the core contribution is\n\
             - trl: technology readiness level from 1 to 9\n\
             - ip_potential: how patentable and defensible the invention is\n\
             Return JSON: {\"novelty_score\": 4, \"trl\": 4, \"ip_potential\": 3, \
             \"novelty_bullets\": [\"...\"], \"rationale\": \"...\"}"
        }
        EvaluatorKind::Market => {
            "Assess MARKET & BUSINESS.\n\
             - customer_clarity_score: clarity of customer and value proposition\n\
             - tam_eu_score: size of the addressable market, with emphasis on the EU\n\
             - competition_score: how favourable the competitive landscape is\n\
             Return JSON: {\"customer_clarity_score\": 3, \"tam_eu_score\": 4, \
             \"competition_score\": 3, \"evidence\": [\"...\"], \"rationale\": \"...\"}"
        }
        EvaluatorKind::Team => {
            "Assess TEAM & FOUNDING POTENTIAL from the author information.\n\
             - translational_score: prior spin-outs, licensing or industry experience\n\
             - eu_skills_score: availability of complementary skills and hiring feasibility in the EU\n\
             Return JSON: {\"translational_score\": 3, \"eu_skills_score\": 3, \
             \"missing_roles\": [\"CEO\"], \"rationale\": \"...\"}"
        }
        EvaluatorKind::Scaling => {
            "Assess SCALING & GO-TO-MARKET.\n\
             - manufacturing_score: feasibility of manufacturing or scaling delivery\n\
             - regulatory_score: how clear and short the regulatory pathway is\n\
             Return JSON: {\"manufacturing_score\": 3, \"regulatory_score\": 2, \
             \"risks\": [\"...\"], \"rationale\": \"...\"}"
        }
        EvaluatorKind::Funding => {
            "Assess FUNDING & EXIT.\n\
             - funding_fit_score: fit with public and venture funding instruments\n\
             - exit_prospects_score: likelihood of acquisition, licensing or IPO\n\
             Return JSON: {\"funding_fit_score\": 4, \"exit_prospects_score\": 3, \
             \"recommended_calls\": [\"EIC Pathfinder\"], \"rationale\": \"...\"}"
        }
        EvaluatorKind::Impact => {
            "Assess IMPACT & ALIGNMENT.\n\
             - sustainability_score: alignment with sustainability and societal goals\n\
             - ethics_gdpr_score: ethics and data-protection acceptability (5 = no concerns)\n\
             Return JSON: {\"sustainability_score\": 4, \"ethics_gdpr_score\": 4, \
             \"positive_impact_points\": [\"...\"], \"rationale\": \"...\"}"
        }
    }
}

/// Build the user prompt for `kind`, truncating inputs to `max_chars` each.
pub fn build_prompt(kind: EvaluatorKind, input: &EvaluatorInput, max_chars: usize) -> String {
    let mut prompt = String::from(instructions(kind));
    let label = match kind {
        EvaluatorKind::Team if input.context.is_some() => "Authors",
        _ => "Paper",
    };
    prompt.push_str(&format!(
        "\n\n{label}:\n{}",
        truncate_chars(&input.text, max_chars)
    ));
    if let Some(context) = &input.context {
        prompt.push_str(&format!(
            "\n\nResearch context:\n{}",
            truncate_chars(context, max_chars)
        ));
    }
    prompt
}

/// Evaluator for one kind backed by a shared [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmEvaluator {
    kind: EvaluatorKind,
    client: Arc<LlmClient>,
    max_input_chars: usize,
}

impl LlmEvaluator {
    pub fn new(kind: EvaluatorKind, client: Arc<LlmClient>, max_input_chars: usize) -> Self {
        Self {
            kind,
            client,
            max_input_chars,
        }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        let prompt = build_prompt(self.kind, input, self.max_input_chars);
        debug!(kind = %self.kind, model = %self.client.model(), prompt_chars = prompt.len(), "sending prompt");
        let text = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(RawOutput::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let err = LlmClient::new(&LlmConfig::default()).unwrap_err();
        assert!(matches!(err, EvaluatorError::Unavailable(_)));

        let config = LlmConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://localhost:1/".into(),
            ..Default::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:1/v1/messages");
    }

    #[test]
    fn test_parse_messages_response() {
        let payload = json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "{\"trl\": "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "5}"}
            ]
        });
        assert_eq!(parse_messages_response(&payload).unwrap(), "{\"trl\": 5}");
    }

    #[test]
    fn test_parse_empty_response_is_malformed() {
        let err = parse_messages_response(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, EvaluatorError::MalformedResponse(_)));
        let err = parse_messages_response(&json!("nope")).unwrap_err();
        assert!(matches!(err, EvaluatorError::MalformedResponse(_)));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_team_prompt_includes_authors_and_context() {
        let input = EvaluatorInput {
            text: "Dr. Ada Lovelace".into(),
            context: Some("Analytical engines".into()),
        };
        let prompt = build_prompt(EvaluatorKind::Team, &input, 100);
        assert!(prompt.contains("Authors:\nDr. Ada Lovelace"));
        assert!(prompt.contains("Research context:\nAnalytical engines"));
        assert!(prompt.contains("translational_score"));
    }

    #[test]
    fn test_prompt_truncates_document() {
        let input = EvaluatorInput::new("x".repeat(50));
        let prompt = build_prompt(EvaluatorKind::Market, &input, 10);
        assert!(prompt.ends_with(&format!("Paper:\n{}", "x".repeat(10))));
    }
}
