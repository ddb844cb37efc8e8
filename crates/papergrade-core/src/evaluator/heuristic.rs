//! Deterministic keyword-indicator evaluators.
//!
//! Used by the degraded `heuristic` strategy when no model backend is
//! configured. Each kind has a profile of signals; a signal counts the
//! distinct keywords it finds (whole words, case-insensitive) and turns the
//! count into a 0-5 score under the field name the normalizer expects.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{Evaluator, EvaluatorError, EvaluatorInput};
use crate::domain::{EvaluatorKind, RawOutput};

/// Score before any keyword is found.
const BASE_SCORE: f64 = 1.0;

struct SignalSpec {
    field: &'static str,
    base: f64,
    per_hit: f64,
    boosts: &'static [&'static str],
    penalties: &'static [&'static str],
}

const TECH_IP: &[SignalSpec] = &[
    SignalSpec {
        field: "novelty_score",
        base: BASE_SCORE,
        per_hit: 1.0,
        boosts: &[
            "novel",
            "breakthrough",
            "revolutionary",
            "cutting-edge",
            "first",
            "innovative",
            "pioneering",
            "unprecedented",
        ],
        penalties: &["incremental", "well-known", "conventional"],
    },
    SignalSpec {
        field: "ip_potential",
        base: BASE_SCORE,
        per_hit: 0.75,
        boosts: &[
            "patent",
            "patented",
            "proprietary",
            "invention",
            "algorithm",
            "method",
            "device",
            "formulation",
        ],
        penalties: &["open source", "prior art"],
    },
];

const MARKET: &[SignalSpec] = &[
    SignalSpec {
        field: "customer_clarity_score",
        base: BASE_SCORE,
        per_hit: 0.75,
        boosts: &[
            "customer",
            "user",
            "patient",
            "demand",
            "revenue",
            "business",
            "industry",
            "cost reduction",
        ],
        penalties: &[],
    },
    SignalSpec {
        field: "tam_eu_score",
        base: BASE_SCORE,
        per_hit: 1.0,
        boosts: &[
            "billion",
            "million",
            "global",
            "worldwide",
            "europe",
            "european",
            "market size",
        ],
        penalties: &[],
    },
    SignalSpec {
        field: "competition_score",
        base: 2.5,
        per_hit: 0.75,
        boosts: &["unmet need", "first-mover", "no existing", "niche", "outperforms"],
        penalties: &["competitor", "competitors", "incumbent", "crowded", "saturated"],
    },
];

const TEAM: &[SignalSpec] = &[
    SignalSpec {
        field: "translational_score",
        base: BASE_SCORE,
        per_hit: 0.75,
        boosts: &[
            "phd",
            "professor",
            "founder",
            "co-founder",
            "spin-off",
            "startup",
            "industry",
            "patent",
        ],
        penalties: &[],
    },
    SignalSpec {
        field: "eu_skills_score",
        base: BASE_SCORE,
        per_hit: 0.75,
        boosts: &[
            "engineer",
            "scientist",
            "expert",
            "experience",
            "expertise",
            "business",
            "collaboration",
            "partnership",
        ],
        penalties: &[],
    },
];

const SCALING: &[SignalSpec] = &[
    SignalSpec {
        field: "manufacturing_score",
        base: BASE_SCORE,
        per_hit: 1.0,
        boosts: &[
            "scale",
            "scalable",
            "mass production",
            "manufacturing",
            "low-cost",
            "replicate",
            "automated",
        ],
        penalties: &["challenge", "limitation", "constraint", "bottleneck", "barrier"],
    },
    SignalSpec {
        field: "regulatory_score",
        base: 2.5,
        per_hit: 0.75,
        boosts: &["approved", "certified", "compliant", "ce mark", "standard"],
        penalties: &["clinical trial", "fda", "ema", "regulatory hurdle", "approval required"],
    },
];

const FUNDING: &[SignalSpec] = &[
    SignalSpec {
        field: "funding_fit_score",
        base: BASE_SCORE,
        per_hit: 0.75,
        boosts: &[
            "funding",
            "investment",
            "capital",
            "grant",
            "horizon europe",
            "eic",
            "venture",
        ],
        penalties: &[],
    },
    SignalSpec {
        field: "exit_prospects_score",
        base: BASE_SCORE,
        per_hit: 1.0,
        boosts: &["acquisition", "ipo", "licensing", "license", "spin-off", "partnership"],
        penalties: &[],
    },
];

const IMPACT: &[SignalSpec] = &[
    SignalSpec {
        field: "sustainability_score",
        base: BASE_SCORE,
        per_hit: 0.5,
        boosts: &[
            "sustainable",
            "sustainability",
            "environment",
            "climate",
            "emissions",
            "health",
            "society",
            "renewable",
            "circular",
        ],
        penalties: &[],
    },
    SignalSpec {
        field: "ethics_gdpr_score",
        base: 3.5,
        per_hit: 0.5,
        boosts: &["transparent", "ethical", "consent", "open access"],
        penalties: &[
            "personal data",
            "privacy",
            "surveillance",
            "animal testing",
            "dual-use",
            "biometric",
        ],
    },
];

/// Readiness ladder scanned for the highest level mentioned.
const TRL_LADDER: &[(&str, u8)] = &[
    ("basic research", 1),
    ("proof of concept", 3),
    ("laboratory", 4),
    ("validation", 4),
    ("prototype", 5),
    ("demonstration", 6),
    ("pilot", 6),
    ("field trial", 7),
    ("production", 8),
    ("commercially available", 9),
];

const DEFAULT_TRL: u8 = 2;

fn specs_for(kind: EvaluatorKind) -> &'static [SignalSpec] {
    match kind {
        EvaluatorKind::TechIp => TECH_IP,
        EvaluatorKind::Market => MARKET,
        EvaluatorKind::Team => TEAM,
        EvaluatorKind::Scaling => SCALING,
        EvaluatorKind::Funding => FUNDING,
        EvaluatorKind::Impact => IMPACT,
    }
}

/// Build a whole-word, case-insensitive alternation. `None` for an empty list.
fn keyword_regex(keywords: &[&str]) -> Result<Option<Regex>, regex::Error> {
    if keywords.is_empty() {
        return Ok(None);
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).map(Some)
}

/// Distinct lowercase keywords matched in `text`.
fn distinct_hits(re: Option<&Regex>, text: &str) -> BTreeSet<String> {
    re.map(|re| {
        re.find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    })
    .unwrap_or_default()
}

struct Signal {
    field: &'static str,
    base: f64,
    per_hit: f64,
    boosts: Option<Regex>,
    penalties: Option<Regex>,
}

impl Signal {
    fn compile(spec: &SignalSpec) -> Result<Self, regex::Error> {
        Ok(Self {
            field: spec.field,
            base: spec.base,
            per_hit: spec.per_hit,
            boosts: keyword_regex(spec.boosts)?,
            penalties: keyword_regex(spec.penalties)?,
        })
    }
}

/// Compiled keyword matchers for all six kinds.
pub struct KeywordProfiles {
    signals: BTreeMap<EvaluatorKind, Vec<Signal>>,
    trl_ladder: Vec<(Regex, u8)>,
}

impl KeywordProfiles {
    /// Compile every profile. Failure here means the heuristic strategy is unusable.
    pub fn compile() -> Result<Self, regex::Error> {
        let mut signals = BTreeMap::new();
        for kind in EvaluatorKind::ALL {
            let compiled = specs_for(kind)
                .iter()
                .map(Signal::compile)
                .collect::<Result<Vec<_>, _>>()?;
            signals.insert(kind, compiled);
        }

        let trl_ladder = TRL_LADDER
            .iter()
            .map(|(phrase, level)| {
                keyword_regex(&[*phrase]).map(|re| re.map(|re| (re, *level)))
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Self {
            signals,
            trl_ladder,
        })
    }

    /// Score `text` for `kind`, producing the evaluator's native JSON shape.
    pub fn score(&self, kind: EvaluatorKind, text: &str) -> Value {
        let mut out = Map::new();
        let mut evidence = Vec::new();
        let mut notes = Vec::new();

        for signal in self.signals.get(&kind).map(Vec::as_slice).unwrap_or(&[]) {
            let boosts = distinct_hits(signal.boosts.as_ref(), text);
            let penalties = distinct_hits(signal.penalties.as_ref(), text);
            let raw = signal.base + signal.per_hit * boosts.len() as f64
                - signal.per_hit * penalties.len() as f64;
            let score = round_half(raw.clamp(0.0, 5.0));
            out.insert(signal.field.to_string(), json!(score));

            evidence.extend(boosts.iter().map(|k| format!("indicator: {k}")));
            evidence.extend(penalties.iter().map(|k| format!("concern: {k}")));
            notes.push(format!(
                "{} {} ({} indicators, {} concerns)",
                signal.field,
                score,
                boosts.len(),
                penalties.len()
            ));
        }

        if kind == EvaluatorKind::TechIp {
            let trl = self.readiness_level(text);
            out.insert("trl".to_string(), json!(trl));
            evidence.push(format!("TRL level: {trl}"));
        }

        out.insert("evidence".to_string(), json!(evidence));
        out.insert(
            "rationale".to_string(),
            json!(format!("keyword analysis: {}", notes.join("; "))),
        );
        out.insert("method".to_string(), json!("keyword_heuristic"));
        Value::Object(out)
    }

    /// Highest readiness level mentioned in `text`.
    pub fn readiness_level(&self, text: &str) -> u8 {
        self.trl_ladder
            .iter()
            .filter(|(re, _)| re.is_match(text))
            .map(|(_, level)| *level)
            .max()
            .unwrap_or(DEFAULT_TRL)
    }
}

fn round_half(v: f64) -> f64 {
    (v * 2.0).round() / 2.0
}

/// Keyword evaluator for one kind.
#[derive(Clone)]
pub struct HeuristicEvaluator {
    kind: EvaluatorKind,
    profiles: Arc<KeywordProfiles>,
}

impl HeuristicEvaluator {
    pub fn new(kind: EvaluatorKind, profiles: Arc<KeywordProfiles>) -> Self {
        Self { kind, profiles }
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(&self, input: &EvaluatorInput) -> Result<RawOutput, EvaluatorError> {
        // Team looks at the authors and the paper together.
        let text = match &input.context {
            Some(context) => format!("{}\n{}", input.text, context),
            None => input.text.clone(),
        };
        Ok(RawOutput::Structured(self.profiles.score(self.kind, &text)))
    }
}
