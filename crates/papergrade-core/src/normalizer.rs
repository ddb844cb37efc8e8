//! Converts raw evaluator output into a typed [`EvaluatorResult`].
//!
//! Parsing is tiered: a strict JSON parse of the whole text, then the first
//! balanced `{...}` span that parses as an object, then
//! `Failure { reason: "unparseable" }`. A parseable object is always a
//! `Success`; sub-scores it does not supply are filled with
//! [`MIDPOINT`](crate::rubric::MIDPOINT).
//!
//! Each evaluator kind has its own field schema mapping the names
//! evaluators actually emit onto rubric sub-criterion keys, together with
//! the scale conversion for that field. Scale conversion happens here and
//! nowhere else.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    EvaluatorKind, EvaluatorResult, EvaluatorSuccess, RawOutput, REASON_UNPARSEABLE,
};
use crate::rubric::{Rubric, MAX_RAW, MIDPOINT};

/// How a 1-9 technology readiness level maps onto the 0-5 sub-score scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessScale {
    /// `trl / 2`, clipped. Reaches 4.5 at TRL 9.
    #[default]
    Halved,
    /// `(trl - 1) * 5 / 8`, so TRL 1 maps to 0 and TRL 9 to 5.
    Linear,
}

impl ReadinessScale {
    pub fn convert(self, trl: f64) -> f64 {
        let scaled = match self {
            ReadinessScale::Halved => trl / 2.0,
            ReadinessScale::Linear => (trl - 1.0) * MAX_RAW / 8.0,
        };
        clip(scaled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    /// Already on the 0-5 scale.
    Direct,
    /// A 1-9 readiness level.
    Readiness,
}

/// Native field names for one rubric sub-criterion, tried in order.
struct FieldSpec {
    key: &'static str,
    sources: &'static [(&'static str, Scale)],
}

use Scale::{Direct, Readiness};

const TECH_IP_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "novelty_breakthrough",
        sources: &[
            ("novelty_breakthrough", Direct),
            ("novelty_score", Direct),
            ("novelty", Direct),
        ],
    },
    FieldSpec {
        key: "trl_feasibility",
        sources: &[
            ("trl_feasibility", Direct),
            ("trl", Readiness),
            ("trl_level", Readiness),
            ("technology_readiness_level", Readiness),
        ],
    },
    FieldSpec {
        key: "ip_patentability",
        sources: &[
            ("ip_patentability", Direct),
            ("ip_potential", Direct),
            ("ip_score", Direct),
            ("patentability_score", Direct),
        ],
    },
];

const MARKET_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "customer_value_prop",
        sources: &[
            ("customer_value_prop", Direct),
            ("customer_clarity_score", Direct),
            ("customer_value_score", Direct),
        ],
    },
    FieldSpec {
        key: "tam_fit",
        sources: &[
            ("tam_fit", Direct),
            ("tam_eu_score", Direct),
            ("tam_score", Direct),
            ("market_size_score", Direct),
        ],
    },
    FieldSpec {
        key: "competitive_landscape",
        sources: &[
            ("competitive_landscape", Direct),
            ("competition_score", Direct),
            ("competitive_score", Direct),
        ],
    },
];

const TEAM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "translational_track_record",
        sources: &[
            ("translational_track_record", Direct),
            ("translational_score", Direct),
            ("track_record_score", Direct),
        ],
    },
    FieldSpec {
        key: "complementary_skills",
        sources: &[
            ("complementary_skills", Direct),
            ("eu_skills_score", Direct),
            ("skills_score", Direct),
        ],
    },
];

const SCALING_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "manufacturing_scale",
        sources: &[
            ("manufacturing_scale", Direct),
            ("manufacturing_score", Direct),
            ("scalability_score", Direct),
        ],
    },
    FieldSpec {
        key: "regulatory_pathway",
        sources: &[
            ("regulatory_pathway", Direct),
            ("regulatory_score", Direct),
        ],
    },
];

const FUNDING_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "fundraising_fit",
        sources: &[
            ("fundraising_fit", Direct),
            ("funding_fit_score", Direct),
            ("funding_score_0_5", Direct),
            ("funding_score", Direct),
        ],
    },
    FieldSpec {
        key: "exit_prospects",
        sources: &[
            ("exit_prospects", Direct),
            ("exit_prospects_score", Direct),
            ("exit_score", Direct),
        ],
    },
];

const IMPACT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "sustainability_alignment",
        sources: &[
            ("sustainability_alignment", Direct),
            ("sustainability_score", Direct),
            ("impact_score_0_5", Direct),
            ("impact_score", Direct),
        ],
    },
    FieldSpec {
        key: "ethics_acceptance",
        sources: &[
            ("ethics_acceptance", Direct),
            ("ethics_gdpr_score", Direct),
            ("ethics_score", Direct),
        ],
    },
];

fn fields_for(kind: EvaluatorKind) -> &'static [FieldSpec] {
    match kind {
        EvaluatorKind::TechIp => TECH_IP_FIELDS,
        EvaluatorKind::Market => MARKET_FIELDS,
        EvaluatorKind::Team => TEAM_FIELDS,
        EvaluatorKind::Scaling => SCALING_FIELDS,
        EvaluatorKind::Funding => FUNDING_FIELDS,
        EvaluatorKind::Impact => IMPACT_FIELDS,
    }
}

/// Nested objects some evaluators wrap their scores in.
const CONTAINERS: &[&str] = &["summary", "market_analysis", "sub_scores", "scores"];

/// List fields collected into `evidence`, in this order.
const EVIDENCE_FIELDS: &[&str] = &[
    "evidence",
    "novelty_bullets",
    "risks",
    "missing_roles",
    "recommended_calls",
    "positive_impact_points",
];

/// Top-level fields consumed by normalization and never copied into `extra`.
const RESERVED_FIELDS: &[&str] = &["rationale", "status", "defaulted", "error", "extra"];

/// Turns raw evaluator output into [`EvaluatorResult`]s. Pure and total.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rubric: Rubric,
    readiness: ReadinessScale,
}

impl Normalizer {
    pub fn new(rubric: Rubric, readiness: ReadinessScale) -> Self {
        Self { rubric, readiness }
    }

    pub fn readiness(&self) -> ReadinessScale {
        self.readiness
    }

    /// Normalize one evaluator's raw output.
    pub fn normalize(&self, kind: EvaluatorKind, raw: &RawOutput) -> EvaluatorResult {
        let object = match raw {
            RawOutput::Text(text) => parse_object(text),
            RawOutput::Structured(Value::Object(map)) => Some(map.clone()),
            RawOutput::Structured(Value::String(text)) => parse_object(text),
            RawOutput::Structured(_) => None,
        };

        match object {
            Some(object) => self.from_object(kind, &object),
            None => EvaluatorResult::failure(REASON_UNPARSEABLE),
        }
    }

    fn from_object(&self, kind: EvaluatorKind, object: &Map<String, Value>) -> EvaluatorResult {
        if let Some(error) = object.get("error").filter(|v| !v.is_null()) {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return EvaluatorResult::failure(format!("upstream error: {message}"));
        }

        let scopes = scopes(object);
        let fields = fields_for(kind);
        let mut sub_scores = BTreeMap::new();
        let mut defaulted = Vec::new();

        // Keys an earlier normalization already filled with the midpoint.
        let previously_defaulted: BTreeSet<&str> = object
            .get("defaulted")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for criterion in self.rubric.criteria_for(kind) {
            let value = if previously_defaulted.contains(criterion.key) {
                None
            } else {
                fields
                    .iter()
                    .find(|f| f.key == criterion.key)
                    .and_then(|spec| self.lookup(spec, &scopes))
            };
            match value {
                Some(v) => {
                    sub_scores.insert(criterion.key.to_string(), v);
                }
                None => {
                    sub_scores.insert(criterion.key.to_string(), MIDPOINT);
                    defaulted.push(criterion.key.to_string());
                }
            }
        }

        let mut evidence = Vec::new();
        for scope in &scopes {
            for field in EVIDENCE_FIELDS {
                if let Some(items) = scope.get(*field) {
                    collect_strings(items, &mut evidence);
                }
            }
        }

        let rationale = scopes
            .iter()
            .find_map(|s| s.get("rationale").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        let known: BTreeSet<&str> = fields
            .iter()
            .flat_map(|f| f.sources.iter().map(|(name, _)| *name))
            .chain(CONTAINERS.iter().copied())
            .chain(EVIDENCE_FIELDS.iter().copied())
            .chain(RESERVED_FIELDS.iter().copied())
            .collect();
        let mut extra: Map<String, Value> = object
            .iter()
            .filter(|(k, _)| !known.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(Value::Object(previous)) = object.get("extra") {
            for (k, v) in previous {
                extra.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        EvaluatorResult::Success(EvaluatorSuccess {
            sub_scores,
            evidence,
            rationale,
            defaulted,
            extra,
        })
    }

    fn lookup(&self, spec: &FieldSpec, scopes: &[&Map<String, Value>]) -> Option<f64> {
        for scope in scopes {
            for (name, scale) in spec.sources {
                if let Some(raw) = scope.get(*name).and_then(as_number) {
                    return Some(match scale {
                        Scale::Direct => clip(raw),
                        Scale::Readiness => self.readiness.convert(raw),
                    });
                }
            }
        }
        None
    }
}

/// The top-level object followed by any known nested containers.
fn scopes(object: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let mut scopes = vec![object];
    for name in CONTAINERS {
        if let Some(Value::Object(inner)) = object.get(*name) {
            scopes.push(inner);
        }
    }
    scopes
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn clip(value: f64) -> f64 {
    value.clamp(0.0, MAX_RAW)
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                    Value::String(_) | Value::Null => {}
                    other => out.push(other.to_string()),
                }
            }
        }
        Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
        _ => {}
    }
}

/// Strict parse first, then the first balanced `{...}` span that is an object.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(map);
    }
    extract_object(text)
}

/// Scan for balanced `{...}` spans, honouring JSON string literals, and
/// return the first one that parses as an object.
pub fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = balanced_end(bytes, open) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[open..=close]) {
                return Some(map);
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the `}` closing the brace at `open`, if any.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
