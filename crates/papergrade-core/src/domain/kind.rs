//! The six fixed rubric facets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One evaluator per rubric facet.
///
/// Ordering follows the rubric category order, so keyed maps iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    TechIp,
    Market,
    Team,
    Scaling,
    Funding,
    Impact,
}

impl EvaluatorKind {
    pub const ALL: [EvaluatorKind; 6] = [
        EvaluatorKind::TechIp,
        EvaluatorKind::Market,
        EvaluatorKind::Team,
        EvaluatorKind::Scaling,
        EvaluatorKind::Funding,
        EvaluatorKind::Impact,
    ];

    /// Wire name used in requests and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::TechIp => "tech_ip",
            EvaluatorKind::Market => "market",
            EvaluatorKind::Team => "team",
            EvaluatorKind::Scaling => "scaling",
            EvaluatorKind::Funding => "funding",
            EvaluatorKind::Impact => "impact",
        }
    }
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown evaluator name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown evaluator kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for EvaluatorKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tech_ip" | "techip" | "tech" => Ok(EvaluatorKind::TechIp),
            "market" => Ok(EvaluatorKind::Market),
            "team" => Ok(EvaluatorKind::Team),
            "scaling" => Ok(EvaluatorKind::Scaling),
            "funding" => Ok(EvaluatorKind::Funding),
            "impact" => Ok(EvaluatorKind::Impact),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for kind in EvaluatorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_from_str_accepts_wire_names() {
        assert_eq!("tech_ip".parse::<EvaluatorKind>().unwrap(), EvaluatorKind::TechIp);
        assert_eq!(" Team ".parse::<EvaluatorKind>().unwrap(), EvaluatorKind::Team);
        assert!("legal".parse::<EvaluatorKind>().is_err());
    }

    #[test]
    fn test_ordering_is_rubric_order() {
        let mut kinds = vec![
            EvaluatorKind::Impact,
            EvaluatorKind::TechIp,
            EvaluatorKind::Team,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![EvaluatorKind::TechIp, EvaluatorKind::Team, EvaluatorKind::Impact]
        );
    }
}
