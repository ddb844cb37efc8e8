//! Timestamped JSON snapshots of evaluation responses, for auditing.
//!
//! The document itself is never written; only its SHA-256 digest and length.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::response::EvaluationResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLogConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub prefix: String,
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("./logs"),
            prefix: "run".to_string(),
        }
    }
}

/// Envelope persisted for each run.
#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    document_sha256: String,
    document_chars: usize,
    author_text_present: bool,
    response: &'a EvaluationResponse,
}

/// Writes one file per evaluation into a directory.
#[derive(Debug, Clone)]
pub struct RunLog {
    directory: PathBuf,
    prefix: String,
}

impl RunLog {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// `None` when run logging is disabled.
    pub fn from_config(config: &RunLogConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.directory.clone(), config.prefix.clone()))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<prefix>_<YYYYmmdd_HHMMSS>_<run-id-short>.json`
    pub fn file_name(&self, response: &EvaluationResponse) -> String {
        let run_id = response.run_id.simple().to_string();
        format!(
            "{}_{}_{}.json",
            self.prefix,
            response.evaluated_at.format("%Y%m%d_%H%M%S"),
            &run_id[..8]
        )
    }

    /// Write the snapshot and return its path.
    pub async fn record(
        &self,
        response: &EvaluationResponse,
        document_text: &str,
        author_text_present: bool,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("create run log directory {:?}", self.directory))?;

        let record = RunRecord {
            document_sha256: sha256_hex(document_text),
            document_chars: document_text.chars().count(),
            author_text_present,
            response,
        };
        let content = serde_json::to_string_pretty(&record).context("serialize run log")?;

        let path = self.directory.join(self.file_name(response));
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("write {:?}", path))?;
        tracing::info!(path = %path.display(), "saved run log");
        Ok(path)
    }
}

fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
