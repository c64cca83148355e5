//! The ordered analysis phases. Each phase sees only the run input and the
//! outputs of phases that already completed, and returns one typed output.
//!
//! The business logic here is deliberately thin data shaping; the engine
//! this crate exists for is the adaptation fan-out in the reports phase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::extract::ExtractorSet;
use super::state::PhaseName;
use crate::assessment::AssessmentInput;
use crate::config::Config;
use crate::content::{ContentItem, ContentType};
use crate::error::PhaseError;
use crate::output::document::{self, DocumentArtifact, Fragment};
use crate::registry::Registry;
use crate::transform;

/// Score below which a category is a risk.
const RISK_FLOOR: f64 = 60.0;
/// Band [RISK_FLOOR, QUICK_WIN_CEILING) yields quick wins.
const QUICK_WIN_CEILING: f64 = 75.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    /// 0-100 scale.
    pub score: f64,
    /// Number of responses that carried a numeric value.
    pub answered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringOutput {
    pub overall_score: f64,
    pub categories: Vec<CategoryScore>,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNarrative {
    pub name: String,
    pub score: f64,
    /// Markup body for the category deep-dive.
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesOutput {
    pub narratives: Vec<CategoryNarrative>,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RisksOutput {
    pub items: Vec<ContentItem>,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsOutput {
    pub recommendations: Vec<ContentItem>,
    pub quick_wins: Vec<ContentItem>,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapOutput {
    pub phases: Vec<ContentItem>,
    pub financial_metrics: Vec<ContentItem>,
    pub tokens_used: u64,
}

/// Output of the final phase: the assembled deliverable documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub documents: Vec<DocumentArtifact>,
    pub fragment_count: usize,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PhaseOutput {
    Scoring(ScoringOutput),
    Categories(CategoriesOutput),
    Risks(RisksOutput),
    Recommendations(RecommendationsOutput),
    Roadmap(RoadmapOutput),
    Reports(ReportBundle),
}

impl PhaseOutput {
    pub fn tokens_used(&self) -> u64 {
        match self {
            PhaseOutput::Scoring(o) => o.tokens_used,
            PhaseOutput::Categories(o) => o.tokens_used,
            PhaseOutput::Risks(o) => o.tokens_used,
            PhaseOutput::Recommendations(o) => o.tokens_used,
            PhaseOutput::Roadmap(o) => o.tokens_used,
            PhaseOutput::Reports(o) => o.tokens_used,
        }
    }
}

/// Everything a phase may read: the run input plus prior phases' outputs.
pub struct PhaseContext<'a> {
    pub input: &'a AssessmentInput,
    pub outputs: &'a BTreeMap<PhaseName, PhaseOutput>,
    pub config: &'a Config,
    pub registry: &'a Registry,
    pub extractors: &'a ExtractorSet,
    pub output_dir: &'a Path,
}

impl<'a> PhaseContext<'a> {
    fn scoring(&self, phase: PhaseName) -> Result<&'a ScoringOutput, PhaseError> {
        match self.outputs.get(&PhaseName::Scoring) {
            Some(PhaseOutput::Scoring(o)) => Ok(o),
            _ => Err(PhaseError::MissingUpstream {
                phase: phase.as_str(),
                needs: PhaseName::Scoring.as_str(),
            }),
        }
    }
}

#[async_trait]
pub trait Phase: Send + Sync {
    fn name(&self) -> PhaseName;

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError>;
}

/// The built-in phase list, in the fixed execution order.
pub fn default_phases() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(ScoringPhase),
        Box::new(CategoriesPhase),
        Box::new(RisksPhase),
        Box::new(RecommendationsPhase),
        Box::new(RoadmapPhase),
        Box::new(ReportsPhase),
    ]
}

/// Rough chars-to-tokens estimate used for cost accounting.
fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64 / 4).max(1)
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

pub struct ScoringPhase;

#[async_trait]
impl Phase for ScoringPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Scoring
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        // Group by category, first-seen order.
        let mut categories: Vec<(String, Vec<f64>, usize)> = Vec::new();
        for response in &ctx.input.responses {
            let idx = match categories.iter().position(|(n, _, _)| *n == response.category) {
                Some(idx) => idx,
                None => {
                    categories.push((response.category.clone(), Vec::new(), 0));
                    categories.len() - 1
                }
            };
            let entry = &mut categories[idx];
            if let Some(value) = response.value {
                entry.1.push(value);
                entry.2 += 1;
            }
        }

        if categories.iter().all(|(_, values, _)| values.is_empty()) {
            return Err(PhaseError::Failed(
                "no scorable responses in submission".to_string(),
            ));
        }

        let scored: Vec<CategoryScore> = categories
            .into_iter()
            .map(|(name, values, answered)| {
                let score = if values.is_empty() {
                    0.0
                } else {
                    let mean = values.iter().sum::<f64>() / values.len() as f64;
                    (mean * 10.0).clamp(0.0, 100.0)
                };
                CategoryScore {
                    name,
                    score,
                    answered,
                }
            })
            .collect();

        let overall_score =
            scored.iter().map(|c| c.score).sum::<f64>() / scored.len() as f64;

        let consumed = serde_json::to_string(ctx.input).unwrap_or_default();
        Ok(PhaseOutput::Scoring(ScoringOutput {
            overall_score,
            categories: scored,
            tokens_used: estimate_tokens(&consumed),
        }))
    }
}

pub struct CategoriesPhase;

#[async_trait]
impl Phase for CategoriesPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Categories
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        let scoring = ctx.scoring(self.name())?;

        let mut tokens = 0u64;
        let narratives = scoring
            .categories
            .iter()
            .map(|c| {
                let band = if c.score < 40.0 {
                    "in critical condition"
                } else if c.score < RISK_FLOOR {
                    "under pressure"
                } else if c.score < QUICK_WIN_CEILING {
                    "stable but with room to improve"
                } else {
                    "a clear strength"
                };
                let narrative = format!(
                    "<h3>{}</h3><p>{} scored <strong>{:.0} out of 100</strong> and is {}. \
                     {} responses informed this score.</p>",
                    c.name, c.name, c.score, band, c.answered
                );
                tokens += estimate_tokens(&narrative);
                CategoryNarrative {
                    name: c.name.clone(),
                    score: c.score,
                    narrative,
                }
            })
            .collect();

        Ok(PhaseOutput::Categories(CategoriesOutput {
            narratives,
            tokens_used: tokens,
        }))
    }
}

pub struct RisksPhase;

#[async_trait]
impl Phase for RisksPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Risks
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        let scoring = ctx.scoring(self.name())?;

        let mut tokens = 0u64;
        let mut items = Vec::new();
        for c in scoring.categories.iter().filter(|c| c.score < RISK_FLOOR) {
            let urgency = if c.score < 40.0 { "critical" } else { "serious" };
            let gap = RISK_FLOOR - c.score;
            let body = format!(
                "<h3>{name} is under pressure</h3>\
                 <p>{name} scored <strong>{score:.0} out of 100</strong>, a {urgency} risk to revenue if left unaddressed. \
                 It should be noted that the organization must close a {gap:.0}-point gap just to reach the healthy floor.</p>\
                 <ul>\
                 <li>Score sits {gap:.0} points under the {floor:.0}-point floor.</li>\
                 <li>{answered} responses informed this category.</li>\
                 <li>Left alone, weakness here compounds into cost and lost opportunity.</li>\
                 </ul>\
                 <figure><img src=\"charts/{slug}.png\" alt=\"{name} score\"></figure>\
                 <details>Methodology: category scores are response means scaled to 0-100; \
                 the healthy floor is {floor:.0}.</details>",
                name = c.name,
                score = c.score,
                urgency = urgency,
                gap = gap,
                floor = RISK_FLOOR,
                answered = c.answered,
                slug = slug(&c.name),
            );
            tokens += estimate_tokens(&body);
            items.push(ContentItem::new(ContentType::Risk, slug(&c.name), body));
        }

        Ok(PhaseOutput::Risks(RisksOutput {
            items,
            tokens_used: tokens,
        }))
    }
}

pub struct RecommendationsPhase;

#[async_trait]
impl Phase for RecommendationsPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Recommendations
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        let scoring = ctx.scoring(self.name())?;

        let mut tokens = 0u64;
        let mut recommendations = Vec::new();
        let mut quick_wins = Vec::new();

        for c in &scoring.categories {
            if c.score < RISK_FLOOR {
                let body = format!(
                    "<h3>Strengthen {name}</h3>\
                     <p>The organization must prioritize {name}: lifting the score from \
                     <strong>{score:.0}</strong> toward {target:.0} protects revenue and margin.</p>\
                     <p>Start with a focused 30-day review, assign a single owner, and track \
                     progress against the score weekly.</p>",
                    name = c.name,
                    score = c.score,
                    target = QUICK_WIN_CEILING,
                );
                tokens += estimate_tokens(&body);
                recommendations.push(ContentItem::new(
                    ContentType::Recommendation,
                    slug(&c.name),
                    body,
                ));
            } else if c.score < QUICK_WIN_CEILING {
                let body = format!(
                    "<h3>Quick win: tighten {name}</h3>\
                     <p>{name} sits at <strong>{score:.0}</strong>; small process fixes should move it above \
                     {target:.0} within a month.</p>",
                    name = c.name,
                    score = c.score,
                    target = QUICK_WIN_CEILING,
                );
                tokens += estimate_tokens(&body);
                quick_wins.push(ContentItem::new(ContentType::QuickWin, slug(&c.name), body));
            }
        }

        Ok(PhaseOutput::Recommendations(RecommendationsOutput {
            recommendations,
            quick_wins,
            tokens_used: tokens,
        }))
    }
}

pub struct RoadmapPhase;

#[async_trait]
impl Phase for RoadmapPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Roadmap
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        let scoring = ctx.scoring(self.name())?;

        let buckets: [(&str, &str, Box<dyn Fn(f64) -> bool>); 3] = [
            ("Stabilize", "days 1-30", Box::new(|s| s < 40.0)),
            ("Build", "days 31-90", Box::new(|s| (40.0..RISK_FLOOR).contains(&s))),
            (
                "Accelerate",
                "days 91-180",
                Box::new(|s| (RISK_FLOOR..QUICK_WIN_CEILING).contains(&s)),
            ),
        ];

        let mut tokens = 0u64;
        let mut phases = Vec::new();
        for (i, (title, window, belongs)) in buckets.iter().enumerate() {
            let targets: Vec<&CategoryScore> = scoring
                .categories
                .iter()
                .filter(|c| belongs(c.score))
                .collect();

            let focus = if targets.is_empty() {
                "<p>No categories need work in this window; hold the gains and keep measuring.</p>"
                    .to_string()
            } else {
                let list: String = targets
                    .iter()
                    .map(|c| format!("<li>{} (currently {:.0})</li>", c.name, c.score))
                    .collect();
                format!(
                    "<p>This phase should concentrate on {} priority area(s).</p><ul>{}</ul>",
                    targets.len(),
                    list
                )
            };

            let body = format!(
                "<h3>Phase {}: {} ({})</h3>{}",
                i + 1,
                title,
                window,
                focus
            );
            tokens += estimate_tokens(&body);
            phases.push(ContentItem::new(
                ContentType::RoadmapPhase,
                slug(title),
                body,
            ));
        }

        let weakest = scoring
            .categories
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score));
        let upside: f64 = scoring
            .categories
            .iter()
            .map(|c| (QUICK_WIN_CEILING - c.score).max(0.0) * 0.2)
            .sum();

        let mut financial_metrics = Vec::new();
        let overall_body = format!(
            "<h3>Overall health: {:.0} out of 100</h3>\
             <p>The composite score across {} categories is <strong>{:.0}</strong>.</p>",
            scoring.overall_score,
            scoring.categories.len(),
            scoring.overall_score,
        );
        tokens += estimate_tokens(&overall_body);
        financial_metrics.push(ContentItem::new(
            ContentType::FinancialMetric,
            "overall-health",
            overall_body,
        ));

        let upside_body = format!(
            "<h3>Projected upside: {:.1}% of revenue</h3>\
             <p>Closing the measured gaps is worth an estimated <strong>{:.1}% of annual revenue</strong>{}.</p>",
            upside,
            upside,
            weakest
                .map(|c| format!(", with {} the single largest lever", c.name))
                .unwrap_or_default(),
        );
        tokens += estimate_tokens(&upside_body);
        financial_metrics.push(ContentItem::new(
            ContentType::FinancialMetric,
            "projected-upside",
            upside_body,
        ));

        Ok(PhaseOutput::Roadmap(RoadmapOutput {
            phases,
            financial_metrics,
            tokens_used: tokens,
        }))
    }
}

/// The fan-out phase: every content item produced upstream is pushed
/// through the registry to each (deliverable, section) destination, depth
/// and voice transformed per mapping, then assembled into documents.
pub struct ReportsPhase;

#[async_trait]
impl Phase for ReportsPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Reports
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
        let mut fragments: Vec<Fragment> = Vec::new();
        let mut tokens = 0u64;

        for entry in &ctx.registry.entries {
            let extractor = ctx.extractors.get(&entry.extractor).ok_or_else(|| {
                PhaseError::Failed(format!(
                    "no extractor registered for '{}'",
                    entry.extractor
                ))
            })?;

            let items = extractor.extract(ctx.outputs);
            if items.is_empty() {
                debug!("No '{}' items to place", entry.content_type);
                continue;
            }

            for mapping in ctx.registry.lookup(&entry.content_type) {
                let cap = mapping.max_items.unwrap_or(usize::MAX);
                for item in items.iter().take(cap) {
                    let body = transform::adapt(item, mapping);
                    tokens += estimate_tokens(&body);
                    let fingerprint = document::fragment_fingerprint(
                        &item.content_type.to_string(),
                        &mapping.deliverable.to_string(),
                        &mapping.target_section,
                        &body,
                    );
                    fragments.push(Fragment {
                        deliverable: mapping.deliverable,
                        section: mapping.target_section.clone(),
                        priority: mapping.priority,
                        insertion_point: mapping.insertion_point,
                        fingerprint,
                        body,
                    });
                }
            }
        }

        let documents =
            document::write_documents(ctx.output_dir, &ctx.input.company_name, &fragments)
                .map_err(|e| PhaseError::Failed(e.to_string()))?;

        Ok(PhaseOutput::Reports(ReportBundle {
            documents,
            fragment_count: fragments.len(),
            tokens_used: tokens,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::ExtractorSet;

    fn input_with_scores(pairs: &[(&str, f64)]) -> AssessmentInput {
        let responses = pairs
            .iter()
            .enumerate()
            .map(|(i, (category, value))| crate::assessment::AssessmentResponse {
                question_id: format!("q_{}", i),
                category: category.to_string(),
                value: Some(*value),
                answer: None,
            })
            .collect();
        AssessmentInput {
            submission_id: "sub-t".to_string(),
            company_name: "Acme".to_string(),
            industry: None,
            responses,
        }
    }

    fn run_phase(
        phase: &dyn Phase,
        input: &AssessmentInput,
        outputs: &BTreeMap<PhaseName, PhaseOutput>,
    ) -> Result<PhaseOutput, PhaseError> {
        let config = Config::default();
        let registry = Registry::default();
        let extractors = ExtractorSet::builtin();
        let dir = std::env::temp_dir();
        let ctx = PhaseContext {
            input,
            outputs,
            config: &config,
            registry: &registry,
            extractors: &extractors,
            output_dir: &dir,
        };
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(phase.run(&ctx))
    }

    #[test]
    fn test_scoring_groups_and_scales() {
        let input = input_with_scores(&[
            ("finance", 3.0),
            ("finance", 5.0),
            ("operations", 8.0),
        ]);
        let out = run_phase(&ScoringPhase, &input, &BTreeMap::new()).unwrap();
        let scoring = match out {
            PhaseOutput::Scoring(s) => s,
            other => panic!("unexpected output: {:?}", other),
        };
        assert_eq!(scoring.categories.len(), 2);
        assert_eq!(scoring.categories[0].name, "finance");
        assert!((scoring.categories[0].score - 40.0).abs() < 1e-9);
        assert!((scoring.categories[1].score - 80.0).abs() < 1e-9);
        assert!((scoring.overall_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_rejects_unscorable_input() {
        let mut input = input_with_scores(&[("finance", 1.0)]);
        input.responses[0].value = None;
        let err = run_phase(&ScoringPhase, &input, &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("no scorable responses"));
    }

    #[test]
    fn test_risks_only_below_floor() {
        let input = input_with_scores(&[("finance", 3.0), ("operations", 9.0)]);
        let mut outputs = BTreeMap::new();
        let scoring = run_phase(&ScoringPhase, &input, &outputs).unwrap();
        outputs.insert(PhaseName::Scoring, scoring);

        let out = run_phase(&RisksPhase, &input, &outputs).unwrap();
        let risks = match out {
            PhaseOutput::Risks(r) => r,
            other => panic!("unexpected output: {:?}", other),
        };
        assert_eq!(risks.items.len(), 1);
        assert_eq!(risks.items[0].content_type, ContentType::Risk);
        assert!(risks.items[0].content.contains("finance"));
        assert!(risks.items[0].content.contains("<details>"));
    }

    #[test]
    fn test_risks_requires_scoring() {
        let input = input_with_scores(&[("finance", 3.0)]);
        let err = run_phase(&RisksPhase, &input, &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("requires output of phase 'scoring'"));
    }

    #[test]
    fn test_recommendations_split_quick_wins() {
        let input = input_with_scores(&[
            ("finance", 3.0),    // 30: recommendation
            ("operations", 7.0), // 70: quick win
            ("marketing", 9.0),  // 90: neither
        ]);
        let mut outputs = BTreeMap::new();
        outputs.insert(
            PhaseName::Scoring,
            run_phase(&ScoringPhase, &input, &outputs).unwrap(),
        );

        let out = run_phase(&RecommendationsPhase, &input, &outputs).unwrap();
        let recs = match out {
            PhaseOutput::Recommendations(r) => r,
            other => panic!("unexpected output: {:?}", other),
        };
        assert_eq!(recs.recommendations.len(), 1);
        assert_eq!(recs.quick_wins.len(), 1);
        assert_eq!(recs.quick_wins[0].content_type, ContentType::QuickWin);
    }

    #[test]
    fn test_roadmap_always_three_phases_and_metrics() {
        let input = input_with_scores(&[("finance", 3.0), ("operations", 9.0)]);
        let mut outputs = BTreeMap::new();
        outputs.insert(
            PhaseName::Scoring,
            run_phase(&ScoringPhase, &input, &outputs).unwrap(),
        );

        let out = run_phase(&RoadmapPhase, &input, &outputs).unwrap();
        let roadmap = match out {
            PhaseOutput::Roadmap(r) => r,
            other => panic!("unexpected output: {:?}", other),
        };
        assert_eq!(roadmap.phases.len(), 3);
        assert_eq!(roadmap.financial_metrics.len(), 2);
        assert!(roadmap.phases[0].content.contains("Stabilize"));
    }
}
