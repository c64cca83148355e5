use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::extract::ExtractorSet;
use super::phases::{default_phases, Phase, PhaseContext, PhaseOutput, ReportBundle};
use super::state::{PhaseName, PipelineState};
use crate::assessment::AssessmentInput;
use crate::config::Config;
use crate::error::RegistryError;
use crate::registry::Registry;

/// Consumers receive a full state snapshot after every mutation. A dropped
/// receiver never stalls the run.
pub type ProgressSender = mpsc::UnboundedSender<PipelineState>;

/// What one run returns: the terminal state, plus the assembled reports on
/// success. A failed run still carries every phase output computed before
/// the failure.
#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub state: PipelineState,
    pub reports: Option<ReportBundle>,
    pub error: Option<String>,
}

pub struct Orchestrator {
    config: Config,
    registry: Registry,
    extractors: ExtractorSet,
}

impl Orchestrator {
    pub fn new(config: Config, registry: Registry) -> Result<Self, RegistryError> {
        let extractors = ExtractorSet::builtin();
        registry.validate(&extractors.ids())?;
        Ok(Self {
            config,
            registry,
            extractors,
        })
    }

    /// Run all enabled phases in the fixed order, once. No phase-level
    /// retry: a failed run is restarted whole, by the caller.
    pub async fn run(
        &self,
        input: &AssessmentInput,
        output_dir: &Path,
        progress: Option<ProgressSender>,
    ) -> RunOutcome {
        self.run_phases(default_phases(), input, output_dir, progress)
            .await
    }

    async fn run_phases(
        &self,
        phases: Vec<Box<dyn Phase>>,
        input: &AssessmentInput,
        output_dir: &Path,
        progress: Option<ProgressSender>,
    ) -> RunOutcome {
        let started = Instant::now();
        let mut state = PipelineState::new(&input.submission_id);

        for phase in phases {
            let name = phase.name();
            if !self.config.phases.enabled(name) {
                debug!("Phase {} disabled, skipping", name);
                continue;
            }

            state.current_phase = Some(name);
            state.touch(started);
            emit(&progress, &state);

            let ctx = PhaseContext {
                input,
                outputs: &state.outputs,
                config: &self.config,
                registry: &self.registry,
                extractors: &self.extractors,
                output_dir,
            };

            match phase.run(&ctx).await {
                Ok(output) => {
                    let tokens = output.tokens_used();
                    state.record_output(name, output);
                    state.add_usage(tokens, &self.config.pricing);
                    state.touch(started);
                    emit(&progress, &state);
                    info!(
                        "Phase {} completed ({} tokens, {} ms elapsed)",
                        name, tokens, state.metrics.execution_time_ms
                    );
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("Phase {} failed: {}", name, message);
                    state.fail(message.clone());
                    state.touch(started);
                    emit(&progress, &state);
                    return RunOutcome {
                        success: false,
                        state,
                        reports: None,
                        error: Some(message),
                    };
                }
            }
        }

        state.complete();
        state.touch(started);
        emit(&progress, &state);

        let reports = match state.outputs.get(&PhaseName::Reports) {
            Some(PhaseOutput::Reports(bundle)) => Some(bundle.clone()),
            _ => None,
        };

        RunOutcome {
            success: true,
            state,
            reports,
            error: None,
        }
    }
}

fn emit(progress: &Option<ProgressSender>, state: &PipelineState) {
    if let Some(sender) = progress {
        // Receiver may be gone; that is the consumer's business.
        let _ = sender.send(state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentResponse;
    use crate::error::PhaseError;
    use crate::pipeline::state::RunStatus;
    use async_trait::async_trait;

    fn sample_input() -> AssessmentInput {
        let categories = ["finance", "operations", "marketing", "people"];
        let responses = (0..16)
            .map(|i| AssessmentResponse {
                question_id: format!("q_{}", i),
                category: categories[i % categories.len()].to_string(),
                // finance low, people high, the rest in between.
                value: Some(match i % categories.len() {
                    0 => 3.0,
                    1 => 5.5,
                    2 => 6.8,
                    _ => 9.0,
                }),
                answer: None,
            })
            .collect();
        AssessmentInput {
            submission_id: "sub-orch".to_string(),
            company_name: "Acme Ltd".to_string(),
            industry: Some("manufacturing".to_string()),
            responses,
        }
    }

    struct FailingPhase {
        name: PhaseName,
        message: &'static str,
    }

    #[async_trait]
    impl Phase for FailingPhase {
        fn name(&self) -> PhaseName {
            self.name
        }

        async fn run(&self, _ctx: &PhaseContext<'_>) -> Result<PhaseOutput, PhaseError> {
            Err(PhaseError::Failed(self.message.to_string()))
        }
    }

    #[tokio::test]
    async fn test_full_run_completes_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(Config::default(), Registry::default()).unwrap();

        let outcome = orchestrator.run(&sample_input(), dir.path(), None).await;
        assert!(outcome.success, "error: {:?}", outcome.error);
        assert_eq!(outcome.state.status, RunStatus::Completed);
        assert_eq!(outcome.state.outputs.len(), 6);
        assert!(outcome.state.completed_at.is_some());

        let bundle = outcome.reports.expect("reports bundle");
        assert!(bundle.fragment_count > 0);
        assert!(!bundle.documents.is_empty());
        for doc in &bundle.documents {
            assert!(doc.path.exists());
        }
    }

    #[tokio::test]
    async fn test_failure_preserves_prior_outputs() {
        use crate::pipeline::phases::{CategoriesPhase, ScoringPhase};

        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(Config::default(), Registry::default()).unwrap();

        let phases: Vec<Box<dyn Phase>> = vec![
            Box::new(ScoringPhase),
            Box::new(CategoriesPhase),
            Box::new(FailingPhase {
                name: PhaseName::Risks,
                message: "rate limit",
            }),
        ];
        let outcome = orchestrator
            .run_phases(phases, &sample_input(), dir.path(), None)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("rate limit"));
        assert_eq!(outcome.state.status, RunStatus::Failed);
        assert_eq!(outcome.state.error.as_deref(), Some("rate limit"));
        assert_eq!(outcome.state.current_phase, Some(PhaseName::Risks));

        // Exactly the phases that succeeded, nothing at or after failure.
        assert!(outcome.state.outputs.contains_key(&PhaseName::Scoring));
        assert!(outcome.state.outputs.contains_key(&PhaseName::Categories));
        assert!(!outcome.state.outputs.contains_key(&PhaseName::Risks));
        assert_eq!(outcome.state.outputs.len(), 2);
        assert!(outcome.reports.is_none());
    }

    #[tokio::test]
    async fn test_cost_matches_token_sum() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let per_1k = config.pricing.cost_per_1k_tokens;
        let orchestrator = Orchestrator::new(config, Registry::default()).unwrap();

        let outcome = orchestrator.run(&sample_input(), dir.path(), None).await;
        assert!(outcome.success);

        let token_sum: u64 = outcome
            .state
            .outputs
            .values()
            .map(|o| o.tokens_used())
            .sum();
        assert_eq!(outcome.state.metrics.total_tokens_used, token_sum);

        let expected: f64 = outcome
            .state
            .outputs
            .values()
            .map(|o| o.tokens_used() as f64 / 1000.0 * per_1k)
            .sum();
        assert!((outcome.state.metrics.estimated_cost - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_disabled_phase_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.phases.reports = false;
        let orchestrator = Orchestrator::new(config, Registry::default()).unwrap();

        let outcome = orchestrator.run(&sample_input(), dir.path(), None).await;
        assert!(outcome.success);
        assert!(!outcome.state.outputs.contains_key(&PhaseName::Reports));
        assert!(outcome.reports.is_none());
    }

    #[tokio::test]
    async fn test_progress_snapshots_arrive_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(Config::default(), Registry::default()).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = orchestrator
            .run(&sample_input(), dir.path(), Some(tx))
            .await;
        assert!(outcome.success);

        let mut snapshots = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            snapshots.push(snapshot);
        }
        // Two per phase (start + completion) plus the terminal snapshot.
        assert_eq!(snapshots.len(), 13);
        assert_eq!(snapshots.last().unwrap().status, RunStatus::Completed);

        // Outputs only ever grow.
        for pair in snapshots.windows(2) {
            assert!(pair[0].outputs.len() <= pair[1].outputs.len());
        }
    }
}
