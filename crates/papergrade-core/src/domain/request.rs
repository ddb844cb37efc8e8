//! Evaluation requests and the wire input they are built from.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{EvalError, Result};
use super::kind::EvaluatorKind;

/// One document to evaluate. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    document_text: String,
    author_text: Option<String>,
    requested: BTreeSet<EvaluatorKind>,
}

impl EvaluationRequest {
    /// Build a request.
    ///
    /// Rejects blank document text. Blank author text is treated as absent.
    /// `requested = None` selects every evaluator kind; an explicitly empty
    /// set is rejected.
    pub fn new(
        document_text: impl Into<String>,
        author_text: Option<String>,
        requested: Option<BTreeSet<EvaluatorKind>>,
    ) -> Result<Self> {
        let document_text = document_text.into();
        if document_text.trim().is_empty() {
            return Err(EvalError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }

        let author_text = author_text.filter(|a| !a.trim().is_empty());

        let requested = match requested {
            None => EvaluatorKind::ALL.into_iter().collect(),
            Some(set) if set.is_empty() => {
                return Err(EvalError::InvalidInput(
                    "no valid agents specified".to_string(),
                ))
            }
            Some(set) => set,
        };

        Ok(Self {
            document_text,
            author_text,
            requested,
        })
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn author_text(&self) -> Option<&str> {
        self.author_text.as_deref()
    }

    /// Requested kinds in rubric order.
    pub fn requested(&self) -> &BTreeSet<EvaluatorKind> {
        &self.requested
    }
}

/// `authors` may be sent as one string or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authors {
    One(String),
    Many(Vec<String>),
}

impl Authors {
    /// Flatten into the text handed to evaluators; list entries are joined by newlines.
    pub fn into_text(self) -> String {
        match self {
            Authors::One(s) => s,
            Authors::Many(list) => list
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Request body of the analyze surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub authors: Option<Authors>,
    #[serde(default)]
    pub agents_to_run: Option<Vec<String>>,
}

impl AnalyzeInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(Authors::One(authors.into()));
        self
    }

    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents_to_run = Some(agents.into_iter().map(Into::into).collect());
        self
    }

    /// Validate and convert into an [`EvaluationRequest`].
    ///
    /// Unknown agent names are skipped with a warning. An empty or absent
    /// `agents_to_run` selects every kind.
    pub fn into_request(self) -> Result<EvaluationRequest> {
        let text = self.text.unwrap_or_default();

        let requested = match self.agents_to_run {
            None => None,
            Some(names) if names.is_empty() => None,
            Some(names) => {
                let mut set = BTreeSet::new();
                for name in &names {
                    match name.parse::<EvaluatorKind>() {
                        Ok(kind) => {
                            set.insert(kind);
                        }
                        Err(e) => warn!(agent = %name, error = %e, "ignoring unknown agent"),
                    }
                }
                Some(set)
            }
        };

        EvaluationRequest::new(text, self.authors.map(Authors::into_text), requested)
    }
}
