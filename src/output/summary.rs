//! Human- and machine-readable run summaries, written alongside the
//! deliverables: `summary.json` for tooling, `summary.md` for people.

use crate::error::OutputError;
use crate::metrics::Anomaly;
use crate::pipeline::{PipelineState, ReportBundle, PHASE_ORDER};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub name: String,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub submission_id: String,
    pub status: String,
    pub total_tokens_used: u64,
    pub estimated_cost: f64,
    pub execution_time_ms: u64,
    pub phases: Vec<PhaseSummary>,
    pub documents: Vec<String>,
    pub anomalies: Vec<Anomaly>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn build_summary(
    state: &PipelineState,
    bundle: Option<&ReportBundle>,
    anomalies: &[Anomaly],
) -> RunSummary {
    let phases = PHASE_ORDER
        .iter()
        .filter_map(|phase| {
            state.outputs.get(phase).map(|output| PhaseSummary {
                name: phase.to_string(),
                tokens_used: output.tokens_used(),
            })
        })
        .collect();

    let documents = bundle
        .map(|b| {
            b.documents
                .iter()
                .map(|d| d.path.display().to_string())
                .collect()
        })
        .unwrap_or_default();

    RunSummary {
        generated_at: Utc::now(),
        submission_id: state.submission_id.clone(),
        status: state.status.to_string(),
        total_tokens_used: state.metrics.total_tokens_used,
        estimated_cost: state.metrics.estimated_cost,
        execution_time_ms: state.metrics.execution_time_ms,
        phases,
        documents,
        anomalies: anomalies.to_vec(),
        error: state.error.clone(),
    }
}

/// Write `summary.json` and `summary.md` into `dir`.
pub fn write_summary(dir: &Path, summary: &RunSummary) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(OutputError::CreateDir)?;

    let json = serde_json::to_string_pretty(summary)?;
    fs::write(dir.join("summary.json"), json).map_err(OutputError::WriteDocument)?;

    fs::write(dir.join("summary.md"), render_markdown(summary)).map_err(OutputError::WriteDocument)
}

fn render_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Run Summary: {}\n\n", summary.submission_id));
    out.push_str(&format!("- Status: {}\n", summary.status));
    out.push_str(&format!("- Tokens used: {}\n", summary.total_tokens_used));
    out.push_str(&format!("- Estimated cost: ${:.4}\n", summary.estimated_cost));
    out.push_str(&format!("- Execution time: {} ms\n", summary.execution_time_ms));
    if let Some(error) = &summary.error {
        out.push_str(&format!("- Error: {}\n", error));
    }

    out.push_str("\n## Phases\n\n");
    out.push_str("| Phase | Tokens |\n|-------|--------|\n");
    for phase in &summary.phases {
        out.push_str(&format!("| {} | {} |\n", phase.name, phase.tokens_used));
    }

    if !summary.documents.is_empty() {
        out.push_str("\n## Documents\n\n");
        for doc in &summary.documents {
            out.push_str(&format!("- {}\n", doc));
        }
    }

    if !summary.anomalies.is_empty() {
        out.push_str("\n## Anomalies\n\n");
        for anomaly in &summary.anomalies {
            out.push_str(&format!(
                "- **{}**: {} ({})\n",
                anomaly.severity, anomaly.description, anomaly.recommendation
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AnomalyKind, Severity};
    use crate::pipeline::PipelineState;

    #[test]
    fn test_summary_files_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = PipelineState::new("sub-1");
        state.complete();

        let summary = build_summary(&state, None, &[]);
        write_summary(dir.path(), &summary).unwrap();

        assert!(dir.path().join("summary.json").exists());
        let md = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(md.contains("# Run Summary: sub-1"));
        assert!(md.contains("- Status: completed"));
        assert!(!md.contains("## Anomalies"));
    }

    #[test]
    fn test_failed_run_carries_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = PipelineState::new("sub-2");
        state.fail("rate limit");

        let summary = build_summary(&state, None, &[]);
        write_summary(dir.path(), &summary).unwrap();

        let md = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(md.contains("- Error: rate limit"));
    }

    #[test]
    fn test_anomalies_rendered() {
        let summary = build_summary(
            &PipelineState::new("sub-3"),
            None,
            &[Anomaly {
                kind: AnomalyKind::ScoreOutlier,
                severity: Severity::High,
                affected_categories: vec!["finance".to_string()],
                description: "finance is far below the mean".to_string(),
                recommendation: "review responses".to_string(),
            }],
        );
        let md = render_markdown(&summary);
        assert!(md.contains("## Anomalies"));
        assert!(md.contains("**high**: finance is far below the mean"));
    }
}
