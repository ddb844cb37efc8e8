//! Aggregated scores.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::kind::EvaluatorKind;

/// Discrete letter grade derived from the composite total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored sub-criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    /// Stable key, e.g. `novelty_breakthrough`.
    pub name: String,
    pub label: String,
    /// Raw 0-5 score.
    pub raw: f64,
    /// Fraction of the category weight; fractions sum to 1.0 per category.
    pub sub_weight: f64,
    /// True when the midpoint was used instead of an evaluator value.
    pub defaulted: bool,
}

/// Weighted score of one rubric category.
///
/// `total = weight * Σ(raw / 5 * sub_weight)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub kind: EvaluatorKind,
    pub name: String,
    /// Share of the 100-point total.
    pub weight: f64,
    pub max_score: f64,
    pub sub_scores: Vec<SubScore>,
    pub total: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    /// True when the whole category fell back to midpoint defaults.
    pub defaulted: bool,
}

/// The six category scores, their rounded sum, and the grade mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Fixed rubric order, never completion order.
    pub category_scores: Vec<CategoryScore>,
    /// Rounded to one decimal place.
    pub total: f64,
    pub grade: Grade,
    pub recommendation: String,
}

impl CompositeScore {
    /// Categories that were scored entirely from defaults.
    pub fn degraded_categories(&self) -> Vec<EvaluatorKind> {
        self.category_scores
            .iter()
            .filter(|c| c.defaulted)
            .map(|c| c.kind)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_serde_names() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(serde_json::to_string(&Grade::CPlus).unwrap(), "\"C+\"");
        let g: Grade = serde_json::from_str("\"B+\"").unwrap();
        assert_eq!(g, Grade::BPlus);
    }

    #[test]
    fn test_grade_display() {
        assert_eq!(Grade::D.to_string(), "D");
        assert_eq!(Grade::A.to_string(), "A");
    }
}
