//! Engine configuration: TOML file plus environment overrides.
//!
//! Precedence is defaults, then the file, then environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{EvalError, Result};
use crate::executor::ExecutorConfig;
use crate::normalizer::ReadinessScale;
use crate::run_log::RunLogConfig;

pub const ENV_CONFIG: &str = "PAPERGRADE_CONFIG";
pub const ENV_STRATEGIES: &str = "PAPERGRADE_STRATEGIES";
pub const ENV_MAX_CONCURRENCY: &str = "PAPERGRADE_MAX_CONCURRENCY";
pub const ENV_TASK_TIMEOUT_SECS: &str = "PAPERGRADE_TASK_TIMEOUT_SECS";
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_LLM_BASE_URL: &str = "PAPERGRADE_LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "PAPERGRADE_LLM_MODEL";
pub const ENV_RUN_LOG_DIR: &str = "PAPERGRADE_RUN_LOG_DIR";

/// Settings for the model-backed evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Longer inputs are cut to this many characters before sending.
    pub max_input_chars: usize,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            max_tokens: 1024,
            max_input_chars: 12_000,
            request_timeout_secs: 90,
        }
    }
}

impl LlmConfig {
    /// True when an API key is present and non-blank.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub readiness_scale: ReadinessScale,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Orchestrator cascade, richest strategy first.
    pub strategies: Vec<String>,
    pub executor: ExecutorConfig,
    pub llm: LlmConfig,
    pub scoring: ScoringConfig,
    pub run_log: RunLogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategies: vec!["llm".to_string(), "heuristic".to_string()],
            executor: ExecutorConfig::default(),
            llm: LlmConfig::default(),
            scoring: ScoringConfig::default(),
            run_log: RunLogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `path` (or `$PAPERGRADE_CONFIG`, or defaults), apply the
    /// process environment, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EvalError::Config(e.to_string()))
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup(ENV_STRATEGIES) {
            self.strategies = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup(ENV_MAX_CONCURRENCY) {
            self.executor.max_concurrency = parse_env(ENV_MAX_CONCURRENCY, &v)?;
        }
        if let Some(v) = lookup(ENV_TASK_TIMEOUT_SECS) {
            self.executor.task_timeout_secs = parse_env(ENV_TASK_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = lookup(ENV_LLM_BASE_URL) {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup(ENV_LLM_MODEL) {
            self.llm.model = v;
        }
        if let Some(v) = lookup(ENV_RUN_LOG_DIR) {
            self.run_log.directory = PathBuf::from(v);
            self.run_log.enabled = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.executor.validate()?;
        if self.llm.max_input_chars == 0 {
            return Err(EvalError::Config(
                "llm.max_input_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| EvalError::Config(format!("{key}={value:?}: {e}")))
}
