pub mod markup;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kinds of content the adaptation engine knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Risk,
    Recommendation,
    QuickWin,
    RoadmapPhase,
    FinancialMetric,
}

impl ContentType {
    /// Actionable types get a voice-specific action prefix when transformed.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            ContentType::Risk | ContentType::Recommendation | ContentType::QuickWin
        )
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Risk => write!(f, "risk"),
            ContentType::Recommendation => write!(f, "recommendation"),
            ContentType::QuickWin => write!(f, "quick_win"),
            ContentType::RoadmapPhase => write!(f, "roadmap_phase"),
            ContentType::FinancialMetric => write!(f, "financial_metric"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk" => Ok(ContentType::Risk),
            "recommendation" => Ok(ContentType::Recommendation),
            "quick_win" => Ok(ContentType::QuickWin),
            "roadmap_phase" => Ok(ContentType::RoadmapPhase),
            "financial_metric" => Ok(ContentType::FinancialMetric),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

/// One canonical, fully detailed content fragment before any adaptation.
///
/// Items are produced once by an upstream phase and never mutated; the
/// transformers return new derived strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub content_type: ContentType,

    /// Markup body (the most detailed rendering of this item).
    pub content: String,

    /// Short label used for logging and fragment fingerprints.
    pub label: String,
}

impl ContentItem {
    pub fn new(content_type: ContentType, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_type,
            content: content.into(),
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_content_type_round_trip() {
        for ct in [
            ContentType::Risk,
            ContentType::Recommendation,
            ContentType::QuickWin,
            ContentType::RoadmapPhase,
            ContentType::FinancialMetric,
        ] {
            assert_eq!(ContentType::from_str(&ct.to_string()).unwrap(), ct);
        }
    }

    #[test]
    fn test_actionable_types() {
        assert!(ContentType::Risk.is_actionable());
        assert!(ContentType::QuickWin.is_actionable());
        assert!(!ContentType::RoadmapPhase.is_actionable());
        assert!(!ContentType::FinancialMetric.is_actionable());
    }
}
