use crate::assessment::{self, AssessmentInput};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::metrics;
use crate::output;
use crate::pipeline::{Orchestrator, PhaseName, PhaseOutput, PipelineState, PHASE_ORDER};
use crate::registry::Registry;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    // Load config; a missing file means defaults, an unreadable one is fatal
    let mut config = if args.config.exists() {
        info!("Loading config from {:?}", args.config);
        Config::load(&args.config)?
    } else {
        info!("No config at {:?}, using defaults", args.config);
        Config::default()
    };

    // Apply CLI overrides
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(registry) = args.registry {
        config.registry_file = Some(registry);
    }
    config.validate()?;

    // Pre-flight the raw submission before committing to a run
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&args.input)?)?;
    let report = assessment::preflight(&raw);
    if !report.valid {
        for e in &report.errors {
            error!("pre-flight: {}", e);
        }
        return Err(crate::error::InputError::Preflight(format!(
            "{} error(s), run `briefcraft validate` for details",
            report.errors.len()
        ))
        .into());
    }

    let input = AssessmentInput::load(&args.input)?;

    let registry = match &config.registry_file {
        Some(path) => {
            info!("Loading registry from {:?}", path);
            Registry::load(path)?
        }
        None => Registry::default(),
    };

    if args.dry_run {
        print_execution_plan(&config, &registry, &input);
        return Ok(());
    }

    let run_dir = config.output_dir.join(&input.submission_id);
    info!("Reports will be written to {:?}", run_dir);

    let orchestrator = Orchestrator::new(config.clone(), registry)?;

    // Optional progress stream: every state change logs one line
    let (progress, drain) = if args.progress {
        let (tx, mut rx) = mpsc::unbounded_channel::<PipelineState>();
        let handle = tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                let phase = snapshot
                    .current_phase
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                info!(
                    "[{}] phase={} outputs={} tokens={} cost=${:.4}",
                    snapshot.status,
                    phase,
                    snapshot.outputs.len(),
                    snapshot.metrics.total_tokens_used,
                    snapshot.metrics.estimated_cost
                );
            }
        });
        (Some(tx), Some(handle))
    } else {
        (None, None)
    };

    let outcome = orchestrator.run(&input, &run_dir, progress).await;
    if let Some(handle) = drain {
        let _ = handle.await;
    }

    // Persist the terminal state regardless of outcome
    if let Err(e) = outcome.state.save(&run_dir) {
        warn!("Failed to save pipeline state: {}", e);
    }

    let anomalies = match outcome.state.outputs.get(&PhaseName::Scoring) {
        Some(PhaseOutput::Scoring(scoring)) => {
            let analysis = metrics::analyze_scoring(scoring, &config.anomaly);
            info!("Scoring analysis: {}", analysis.summary);
            analysis.anomalies
        }
        _ => Vec::new(),
    };

    let summary = output::build_summary(&outcome.state, outcome.reports.as_ref(), &anomalies);
    if let Err(e) = output::write_summary(&run_dir, &summary) {
        warn!("Failed to write run summary: {}", e);
    }

    if outcome.success {
        let documents = outcome.reports.as_ref().map(|r| r.documents.len()).unwrap_or(0);
        info!(
            "Completed: {} documents, {}",
            documents,
            metrics::usage_summary(&outcome.state.metrics)
        );
        Ok(())
    } else {
        let message = outcome
            .error
            .unwrap_or_else(|| "pipeline failed".to_string());
        error!(
            "Run failed at phase {}: {} ({} phase outputs preserved)",
            outcome
                .state
                .current_phase
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            message,
            outcome.state.outputs.len()
        );
        std::process::exit(1);
    }
}

fn print_execution_plan(config: &Config, registry: &Registry, input: &AssessmentInput) {
    println!("\n=== Execution Plan ===\n");
    println!("Submission: {} ({})", input.submission_id, input.company_name);
    println!("Responses: {}", input.responses.len());
    println!("Output dir: {:?}", config.output_dir.join(&input.submission_id));
    println!(
        "Pricing: ${} per 1k tokens",
        config.pricing.cost_per_1k_tokens
    );

    println!("\nPhases:");
    for phase in PHASE_ORDER {
        let status = if config.phases.enabled(phase) {
            ""
        } else {
            " [SKIP - disabled]"
        };
        println!("  - {}{}", phase, status);
    }

    println!("\nRegistry:");
    for entry in &registry.entries {
        println!(
            "  - {} -> {} target(s) via '{}'",
            entry.content_type,
            entry.target_mappings.len(),
            entry.extractor
        );
    }
    println!();
}
