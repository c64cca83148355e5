use crate::config::PricingConfig;
use crate::error::OutputError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

use super::phases::PhaseOutput;

const STATE_FILE: &str = "state.json";

/// The fixed, ordered phase list. The orchestrator never runs phases in
/// any other order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Scoring,
    Categories,
    Risks,
    Recommendations,
    Roadmap,
    Reports,
}

pub const PHASE_ORDER: [PhaseName; 6] = [
    PhaseName::Scoring,
    PhaseName::Categories,
    PhaseName::Risks,
    PhaseName::Recommendations,
    PhaseName::Roadmap,
    PhaseName::Reports,
];

impl PhaseName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Scoring => "scoring",
            PhaseName::Categories => "categories",
            PhaseName::Risks => "risks",
            PhaseName::Recommendations => "recommendations",
            PhaseName::Roadmap => "roadmap",
            PhaseName::Reports => "reports",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Processing => write!(f, "processing"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Monotonically non-decreasing usage counters, recomputed on every state
/// mutation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_tokens_used: u64,
    pub estimated_cost: f64,
    pub execution_time_ms: u64,
}

/// The single source of truth for one run's progress. Owned exclusively by
/// the orchestrator; consumers only ever see cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub submission_id: String,

    pub run_id: Uuid,

    pub status: RunStatus,

    /// The phase currently executing, or the one that failed.
    pub current_phase: Option<PhaseName>,

    /// Append-only: entries are added as phases complete and never removed
    /// or overwritten, even after failure.
    pub outputs: BTreeMap<PhaseName, PhaseOutput>,

    pub metrics: RunMetrics,

    /// Present only when `status == failed`.
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineState {
    pub fn new(submission_id: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            run_id: Uuid::new_v4(),
            status: RunStatus::Processing,
            current_phase: None,
            outputs: BTreeMap::new(),
            metrics: RunMetrics::default(),
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record a completed phase's output. Existing entries are never
    /// overwritten.
    pub fn record_output(&mut self, phase: PhaseName, output: PhaseOutput) {
        self.outputs.entry(phase).or_insert(output);
    }

    /// Fold reported token usage into the running cost estimate.
    pub fn add_usage(&mut self, tokens: u64, pricing: &PricingConfig) {
        self.metrics.total_tokens_used += tokens;
        self.metrics.estimated_cost += tokens as f64 / 1000.0 * pricing.cost_per_1k_tokens;
    }

    /// Recompute elapsed time from the captured run start.
    pub fn touch(&mut self, started: Instant) {
        self.metrics.execution_time_ms = started.elapsed().as_millis() as u64;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Persist the final snapshot next to the run's documents, as a
    /// forensic record of what completed.
    pub fn save(&self, dir: &Path) -> Result<(), OutputError> {
        fs::create_dir_all(dir).map_err(OutputError::CreateDir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(STATE_FILE), json).map_err(OutputError::WriteDocument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::ScoringOutput;

    fn scoring_output(tokens: u64) -> PhaseOutput {
        PhaseOutput::Scoring(ScoringOutput {
            overall_score: 50.0,
            categories: Vec::new(),
            tokens_used: tokens,
        })
    }

    #[test]
    fn test_outputs_never_overwritten() {
        let mut state = PipelineState::new("sub-1");
        state.record_output(PhaseName::Scoring, scoring_output(10));
        state.record_output(PhaseName::Scoring, scoring_output(99));

        match state.outputs.get(&PhaseName::Scoring) {
            Some(PhaseOutput::Scoring(s)) => assert_eq!(s.tokens_used, 10),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_cost_accumulates_exactly() {
        let pricing = PricingConfig {
            cost_per_1k_tokens: 0.003,
        };
        let mut state = PipelineState::new("sub-1");
        state.add_usage(1500, &pricing);
        state.add_usage(500, &pricing);

        assert_eq!(state.metrics.total_tokens_used, 2000);
        let expected = 1500.0 / 1000.0 * 0.003 + 500.0 / 1000.0 * 0.003;
        assert!((state.metrics.estimated_cost - expected).abs() < 1e-12);
    }

    #[test]
    fn test_failure_preserves_outputs() {
        let mut state = PipelineState::new("sub-1");
        state.record_output(PhaseName::Scoring, scoring_output(10));
        state.fail("rate limit");

        assert_eq!(state.status, RunStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("rate limit"));
        assert!(state.outputs.contains_key(&PhaseName::Scoring));
    }

    #[test]
    fn test_phase_order_matches_enum_order() {
        let mut sorted = PHASE_ORDER.to_vec();
        sorted.sort();
        assert_eq!(sorted, PHASE_ORDER.to_vec());
    }

    #[test]
    fn test_save_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = PipelineState::new("sub-1");
        state.save(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
        let parsed: PipelineState = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.submission_id, "sub-1");
        assert_eq!(parsed.status, RunStatus::Processing);
    }
}
