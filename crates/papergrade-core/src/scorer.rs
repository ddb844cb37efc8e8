//! Folds a keyed evaluator-result map into the 100-point composite.
//!
//! Pure: the same map always yields the same [`CompositeScore`]. Output is
//! in rubric order regardless of how results were produced. A kind whose
//! result is missing or a failure scores every sub-criterion at the
//! midpoint, so the composite is always defined.

use std::collections::BTreeMap;

use crate::domain::{
    CategoryScore, CompositeScore, EvaluatorKind, EvaluatorResult, RubricError, SubScore,
};
use crate::rubric::{grade_for, validate_categories, Category, Rubric, MAX_RAW, MIDPOINT};

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    rubric: Rubric,
}

impl Scorer {
    /// Build a scorer over `rubric`, rejecting tables that break the weight invariants.
    pub fn new(rubric: Rubric) -> Result<Self, RubricError> {
        validate_categories(rubric.categories())?;
        Ok(Self { rubric })
    }

    /// Scorer over the built-in rubric.
    pub fn standard() -> Self {
        Self {
            rubric: Rubric::standard(),
        }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn score(&self, results: &BTreeMap<EvaluatorKind, EvaluatorResult>) -> CompositeScore {
        let category_scores: Vec<CategoryScore> = self
            .rubric
            .categories()
            .iter()
            .map(|category| score_category(category, results.get(&category.kind)))
            .collect();

        let total = round1(category_scores.iter().map(|c| c.total).sum());
        let (grade, recommendation) = grade_for(total);

        CompositeScore {
            category_scores,
            total,
            grade,
            recommendation: recommendation.to_string(),
        }
    }
}

fn score_category(category: &Category, result: Option<&EvaluatorResult>) -> CategoryScore {
    let success = result.and_then(EvaluatorResult::as_success);

    let sub_scores: Vec<SubScore> = category
        .criteria
        .iter()
        .map(|criterion| {
            let supplied = success.and_then(|s| {
                if s.defaulted.iter().any(|k| k == criterion.key) {
                    return None;
                }
                s.sub_scores.get(criterion.key).copied()
            });
            SubScore {
                name: criterion.key.to_string(),
                label: criterion.label.to_string(),
                raw: supplied.map(|v| v.clamp(0.0, MAX_RAW)).unwrap_or(MIDPOINT),
                sub_weight: criterion.fraction,
                defaulted: supplied.is_none(),
            }
        })
        .collect();

    let total = category.weight
        * sub_scores
            .iter()
            .map(|s| s.raw / MAX_RAW * s.sub_weight)
            .sum::<f64>();

    CategoryScore {
        kind: category.kind,
        name: category.name.to_string(),
        weight: category.weight,
        max_score: category.weight,
        sub_scores,
        total,
        evidence: success.map(|s| s.evidence.clone()).unwrap_or_default(),
        defaulted: success.is_none(),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvaluatorSuccess, Grade};
    use serde_json::Map;

    fn uniform(kind: EvaluatorKind, raw: f64) -> EvaluatorResult {
        let sub_scores = Rubric::standard()
            .criteria_for(kind)
            .iter()
            .map(|c| (c.key.to_string(), raw))
            .collect();
        EvaluatorResult::Success(EvaluatorSuccess {
            sub_scores,
            evidence: vec![format!("{kind} evidence")],
            rationale: String::new(),
            defaulted: vec![],
            extra: Map::new(),
        })
    }

    #[test]
    fn test_category_total_formula() {
        let scorer = Scorer::standard();
        let mut results = BTreeMap::new();
        results.insert(EvaluatorKind::TechIp, uniform(EvaluatorKind::TechIp, 4.0));
        let composite = scorer.score(&results);
        let tech = &composite.category_scores[0];
        assert_eq!(tech.kind, EvaluatorKind::TechIp);
        assert!((tech.total - 20.0).abs() < 1e-9);
        assert!(!tech.defaulted);
        assert_eq!(tech.evidence, vec!["tech_ip evidence".to_string()]);
    }

    #[test]
    fn test_missing_results_default_to_midpoint() {
        let composite = Scorer::standard().score(&BTreeMap::new());
        assert_eq!(composite.total, 50.0);
        assert_eq!(composite.grade, Grade::CPlus);
        assert_eq!(composite.degraded_categories().len(), 6);
        assert!(composite
            .category_scores
            .iter()
            .flat_map(|c| &c.sub_scores)
            .all(|s| s.raw == MIDPOINT && s.defaulted));
    }

    #[test]
    fn test_defaulted_keys_marked() {
        let mut result = uniform(EvaluatorKind::Funding, 5.0);
        if let EvaluatorResult::Success(s) = &mut result {
            s.sub_scores.insert("exit_prospects".into(), MIDPOINT);
            s.defaulted.push("exit_prospects".into());
        }
        let mut results = BTreeMap::new();
        results.insert(EvaluatorKind::Funding, result);
        let funding = Scorer::standard()
            .score(&results)
            .category_scores
            .into_iter()
            .find(|c| c.kind == EvaluatorKind::Funding)
            .unwrap();
        assert!(!funding.defaulted);
        assert!(!funding.sub_scores[0].defaulted);
        assert!(funding.sub_scores[1].defaulted);
        assert!((funding.total - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(84.94), 84.9);
        assert_eq!(round1(84.96), 85.0);
        assert_eq!(round1(100.00000000000003), 100.0);
    }
}
