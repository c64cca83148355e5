//! Extractor dispatch table: registry entries name an extractor by id, and
//! the set built here resolves those ids to implementations at startup.
//! Keeps the registry declarative without stringly-typed calls into
//! arbitrary code.

use std::collections::BTreeMap;

use super::phases::PhaseOutput;
use super::state::PhaseName;
use crate::content::ContentItem;

pub trait Extractor: Send + Sync {
    fn id(&self) -> &'static str;

    /// Pull content items out of the completed phase outputs. Missing
    /// upstream output yields an empty list, never an error.
    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem>;
}

struct RiskExtractor;

impl Extractor for RiskExtractor {
    fn id(&self) -> &'static str {
        "risks"
    }

    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem> {
        match outputs.get(&PhaseName::Risks) {
            Some(PhaseOutput::Risks(o)) => o.items.clone(),
            _ => Vec::new(),
        }
    }
}

struct RecommendationExtractor;

impl Extractor for RecommendationExtractor {
    fn id(&self) -> &'static str {
        "recommendations"
    }

    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem> {
        match outputs.get(&PhaseName::Recommendations) {
            Some(PhaseOutput::Recommendations(o)) => o.recommendations.clone(),
            _ => Vec::new(),
        }
    }
}

struct QuickWinExtractor;

impl Extractor for QuickWinExtractor {
    fn id(&self) -> &'static str {
        "quick_wins"
    }

    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem> {
        match outputs.get(&PhaseName::Recommendations) {
            Some(PhaseOutput::Recommendations(o)) => o.quick_wins.clone(),
            _ => Vec::new(),
        }
    }
}

struct RoadmapPhaseExtractor;

impl Extractor for RoadmapPhaseExtractor {
    fn id(&self) -> &'static str {
        "roadmap_phases"
    }

    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem> {
        match outputs.get(&PhaseName::Roadmap) {
            Some(PhaseOutput::Roadmap(o)) => o.phases.clone(),
            _ => Vec::new(),
        }
    }
}

struct FinancialMetricExtractor;

impl Extractor for FinancialMetricExtractor {
    fn id(&self) -> &'static str {
        "financial_metrics"
    }

    fn extract(&self, outputs: &BTreeMap<PhaseName, PhaseOutput>) -> Vec<ContentItem> {
        match outputs.get(&PhaseName::Roadmap) {
            Some(PhaseOutput::Roadmap(o)) => o.financial_metrics.clone(),
            _ => Vec::new(),
        }
    }
}

pub struct ExtractorSet {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorSet {
    /// The built-in extractors, one per content type the default registry
    /// table references.
    pub fn builtin() -> Self {
        Self {
            extractors: vec![
                Box::new(RiskExtractor),
                Box::new(RecommendationExtractor),
                Box::new(QuickWinExtractor),
                Box::new(RoadmapPhaseExtractor),
                Box::new(FinancialMetricExtractor),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.id() == id)
            .map(|e| e.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.id()).collect()
    }
}
