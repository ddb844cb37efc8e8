//! The fixed six-category, 100-point rubric and its grade table.
//!
//! Category weights sum to exactly 100 and each category's sub-criterion
//! fractions sum to exactly 1.0. [`Rubric::new`] enforces both, plus the
//! lockstep rule that every [`EvaluatorKind`] is covered by exactly one
//! category.

use std::collections::BTreeSet;

use crate::domain::{EvaluatorKind, Grade, RubricError};

/// Midpoint default used for any sub-score an evaluator did not supply.
pub const MIDPOINT: f64 = 2.5;
/// Upper bound of a raw sub-score.
pub const MAX_RAW: f64 = 5.0;
/// Total points available.
pub const MAX_TOTAL: f64 = 100.0;

const EPSILON: f64 = 1e-9;

/// A single 0-5 scored facet within a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubCriterion {
    pub key: &'static str,
    pub label: &'static str,
    pub fraction: f64,
}

/// A weighted top-level rubric section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Category {
    pub kind: EvaluatorKind,
    pub name: &'static str,
    pub weight: f64,
    pub criteria: &'static [SubCriterion],
}

const fn sub(key: &'static str, label: &'static str, fraction: f64) -> SubCriterion {
    SubCriterion {
        key,
        label,
        fraction,
    }
}

pub const STANDARD_CATEGORIES: [Category; 6] = [
    Category {
        kind: EvaluatorKind::TechIp,
        name: "Technology & IP",
        weight: 25.0,
        criteria: &[
            sub("novelty_breakthrough", "Novelty / breakthrough", 0.6),
            sub("trl_feasibility", "TRL feasibility", 0.2),
            sub("ip_patentability", "IP patentability", 0.2),
        ],
    },
    Category {
        kind: EvaluatorKind::Market,
        name: "Market & Business",
        weight: 25.0,
        criteria: &[
            sub("customer_value_prop", "Customer / value clarity", 0.3),
            sub("tam_fit", "Addressable-market fit", 0.4),
            sub("competitive_landscape", "Competitive landscape", 0.3),
        ],
    },
    Category {
        kind: EvaluatorKind::Team,
        name: "Team & Founding",
        weight: 15.0,
        criteria: &[
            sub("translational_track_record", "Translational track record", 0.6),
            sub("complementary_skills", "Complementary skills availability", 0.4),
        ],
    },
    Category {
        kind: EvaluatorKind::Scaling,
        name: "Scaling & Go-to-Market",
        weight: 15.0,
        criteria: &[
            sub("manufacturing_scale", "Manufacturing / scale feasibility", 0.4),
            sub("regulatory_pathway", "Regulatory pathway", 0.6),
        ],
    },
    Category {
        kind: EvaluatorKind::Funding,
        name: "Funding & Exit",
        weight: 10.0,
        criteria: &[
            sub("fundraising_fit", "Fundraising fit", 0.5),
            sub("exit_prospects", "Exit prospects", 0.5),
        ],
    },
    Category {
        kind: EvaluatorKind::Impact,
        name: "Impact & Alignment",
        weight: 10.0,
        criteria: &[
            sub("sustainability_alignment", "Sustainability alignment", 0.5),
            sub("ethics_acceptance", "Ethics / acceptance risk", 0.5),
        ],
    },
];

/// One row of the grade table: inclusive lower bound, grade, recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub lower_bound: f64,
    pub grade: Grade,
    pub recommendation: &'static str,
}

/// Evaluated top-down; first match wins. Anything below the last bound is [`Grade::D`].
pub const GRADE_BANDS: [GradeBand; 6] = [
    GradeBand {
        lower_bound: 85.0,
        grade: Grade::APlus,
        recommendation: "Strong — recommend immediate commercialization",
    },
    GradeBand {
        lower_bound: 75.0,
        grade: Grade::A,
        recommendation: "Recommend commercialization with strong support",
    },
    GradeBand {
        lower_bound: 65.0,
        grade: Grade::BPlus,
        recommendation: "Recommend with targeted improvements",
    },
    GradeBand {
        lower_bound: 55.0,
        grade: Grade::B,
        recommendation: "Moderate — requires significant development",
    },
    GradeBand {
        lower_bound: 45.0,
        grade: Grade::CPlus,
        recommendation: "Limited — major challenges to address",
    },
    GradeBand {
        lower_bound: 35.0,
        grade: Grade::C,
        recommendation: "Low — substantial barriers exist",
    },
];

pub const FALLBACK_RECOMMENDATION: &str = "Very low — not recommended";

/// Map a composite total to its grade and recommendation.
pub fn grade_for(total: f64) -> (Grade, &'static str) {
    GRADE_BANDS
        .iter()
        .find(|band| total >= band.lower_bound)
        .map(|band| (band.grade, band.recommendation))
        .unwrap_or((Grade::D, FALLBACK_RECOMMENDATION))
}

/// A validated rubric.
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    categories: Vec<Category>,
}

impl Rubric {
    /// Validate and wrap a category table.
    pub fn new(categories: Vec<Category>) -> Result<Self, RubricError> {
        validate_categories(&categories)?;
        Ok(Self { categories })
    }

    /// The built-in rubric.
    pub fn standard() -> Self {
        Self {
            categories: STANDARD_CATEGORIES.to_vec(),
        }
    }

    /// Categories in rubric order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, kind: EvaluatorKind) -> Option<&Category> {
        self.categories.iter().find(|c| c.kind == kind)
    }

    /// Sub-criteria an evaluator of `kind` must supply.
    pub fn criteria_for(&self, kind: EvaluatorKind) -> &'static [SubCriterion] {
        self.category(kind).map(|c| c.criteria).unwrap_or(&[])
    }

    pub fn max_score(&self) -> f64 {
        self.categories.iter().map(|c| c.weight).sum()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::standard()
    }
}

/// Check the weight, fraction, and coverage invariants of a category table.
pub fn validate_categories(categories: &[Category]) -> Result<(), RubricError> {
    let weight_sum: f64 = categories.iter().map(|c| c.weight).sum();
    if (weight_sum - MAX_TOTAL).abs() > EPSILON {
        return Err(RubricError::WeightSum { actual: weight_sum });
    }

    let mut seen = BTreeSet::new();
    for category in categories {
        if category.criteria.is_empty() {
            return Err(RubricError::EmptyCategory {
                category: category.name.to_string(),
            });
        }
        let fraction_sum: f64 = category.criteria.iter().map(|s| s.fraction).sum();
        if (fraction_sum - 1.0).abs() > EPSILON {
            return Err(RubricError::FractionSum {
                category: category.name.to_string(),
                actual: fraction_sum,
            });
        }
        if !seen.insert(category.kind) {
            return Err(RubricError::DuplicateKind {
                kind: category.kind.to_string(),
            });
        }
    }

    if let Some(kind) = EvaluatorKind::ALL.iter().find(|k| !seen.contains(k)) {
        return Err(RubricError::MissingKind {
            kind: kind.to_string(),
        });
    }

    Ok(())
}
