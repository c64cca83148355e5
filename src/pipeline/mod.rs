mod extract;
mod orchestrator;
mod phases;
mod state;

pub use extract::ExtractorSet;
pub use orchestrator::{Orchestrator, ProgressSender, RunOutcome};
pub use phases::{
    CategoriesOutput, CategoryScore, PhaseOutput, ReportBundle, RisksOutput, ScoringOutput,
};
pub use state::{PhaseName, PipelineState, RunMetrics, RunStatus, PHASE_ORDER};
