//! Read-only post-processing over a completed scoring output: usage
//! summaries and statistical anomaly flags. Purely observational; nothing
//! here feeds back into pipeline control flow.

use crate::config::AnomalyConfig;
use crate::pipeline::{RunMetrics, ScoringOutput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ScoreOutlier,
    ExcessiveVariance,
    CompletenessGap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub affected_categories: Vec<String>,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: String,
    pub anomalies: Vec<Anomaly>,
}

/// Flag outlier categories, excessive score spread, and data-completeness
/// gaps. Thresholds come from the caller's config so tests can inject
/// alternates.
pub fn analyze_scoring(output: &ScoringOutput, cfg: &AnomalyConfig) -> AnalysisReport {
    let scores: Vec<f64> = output.categories.iter().map(|c| c.score).collect();
    let mean = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let stddev = if scores.len() < 2 {
        0.0
    } else {
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        var.sqrt()
    };

    let mut anomalies = Vec::new();

    if stddev > 0.0 {
        let outliers: Vec<&crate::pipeline::CategoryScore> = output
            .categories
            .iter()
            .filter(|c| ((c.score - mean) / stddev).abs() > cfg.outlier_z)
            .collect();
        for c in outliers {
            let direction = if c.score > mean { "above" } else { "below" };
            anomalies.push(Anomaly {
                kind: AnomalyKind::ScoreOutlier,
                severity: if c.score < mean {
                    Severity::High
                } else {
                    Severity::Medium
                },
                affected_categories: vec![c.name.clone()],
                description: format!(
                    "{} scored {:.0}, more than {:.1} standard deviations {} the {:.0} mean",
                    c.name, c.score, cfg.outlier_z, direction, mean
                ),
                recommendation: format!("Review the {} responses for skew before acting", c.name),
            });
        }
    }

    if stddev > cfg.variance_ceiling {
        anomalies.push(Anomaly {
            kind: AnomalyKind::ExcessiveVariance,
            severity: Severity::Medium,
            affected_categories: output.categories.iter().map(|c| c.name.clone()).collect(),
            description: format!(
                "Category scores spread {:.1} points (ceiling {:.1}); the overall score hides large differences",
                stddev, cfg.variance_ceiling
            ),
            recommendation: "Present category scores individually rather than the composite"
                .to_string(),
        });
    }

    let gaps: Vec<String> = output
        .categories
        .iter()
        .filter(|c| c.answered < cfg.min_answered)
        .map(|c| c.name.clone())
        .collect();
    if !gaps.is_empty() {
        let severity = if gaps.len() > output.categories.len() / 2 {
            Severity::Medium
        } else {
            Severity::Low
        };
        anomalies.push(Anomaly {
            kind: AnomalyKind::CompletenessGap,
            severity,
            description: format!(
                "{} categor{} answered by fewer than {} responses",
                gaps.len(),
                if gaps.len() == 1 { "y" } else { "ies" },
                cfg.min_answered
            ),
            recommendation: "Treat these category scores as low-confidence".to_string(),
            affected_categories: gaps,
        });
    }

    let summary = format!(
        "{} categories, mean {:.1}, stddev {:.1}, {} anomal{}",
        output.categories.len(),
        mean,
        stddev,
        anomalies.len(),
        if anomalies.len() == 1 { "y" } else { "ies" },
    );

    AnalysisReport { summary, anomalies }
}

/// One-line usage rollup for logs and the run summary.
pub fn usage_summary(metrics: &RunMetrics) -> String {
    format!(
        "{} tokens, estimated cost ${:.4}, {} ms",
        metrics.total_tokens_used, metrics.estimated_cost, metrics.execution_time_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CategoryScore;

    fn output(scores: &[(&str, f64, usize)]) -> ScoringOutput {
        let categories = scores
            .iter()
            .map(|(name, score, answered)| CategoryScore {
                name: name.to_string(),
                score: *score,
                answered: *answered,
            })
            .collect();
        ScoringOutput {
            overall_score: 0.0,
            categories,
            tokens_used: 0,
        }
    }

    #[test]
    fn test_flat_scores_have_no_anomalies() {
        let report = analyze_scoring(
            &output(&[("a", 60.0, 4), ("b", 62.0, 4), ("c", 61.0, 4)]),
            &AnomalyConfig::default(),
        );
        assert!(report.anomalies.is_empty(), "{:?}", report.anomalies);
    }

    #[test]
    fn test_outlier_flagged_low_is_high_severity() {
        // Tight cluster with one far-off category.
        let cfg = AnomalyConfig {
            outlier_z: 1.5,
            ..AnomalyConfig::default()
        };
        let report = analyze_scoring(
            &output(&[
                ("a", 70.0, 4),
                ("b", 72.0, 4),
                ("c", 71.0, 4),
                ("d", 69.0, 4),
                ("e", 20.0, 4),
            ]),
            &cfg,
        );
        let outlier = report
            .anomalies
            .iter()
            .find(|a| a.kind == AnomalyKind::ScoreOutlier)
            .expect("outlier anomaly");
        assert_eq!(outlier.severity, Severity::High);
        assert_eq!(outlier.affected_categories, vec!["e".to_string()]);
    }

    #[test]
    fn test_variance_threshold_is_injectable() {
        let scores = output(&[("a", 20.0, 4), ("b", 80.0, 4)]);
        let strict = AnomalyConfig {
            variance_ceiling: 10.0,
            ..AnomalyConfig::default()
        };
        let loose = AnomalyConfig {
            variance_ceiling: 50.0,
            ..AnomalyConfig::default()
        };
        assert!(analyze_scoring(&scores, &strict)
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::ExcessiveVariance));
        assert!(!analyze_scoring(&scores, &loose)
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::ExcessiveVariance));
    }

    #[test]
    fn test_completeness_gap() {
        let report = analyze_scoring(
            &output(&[("a", 60.0, 1), ("b", 62.0, 5)]),
            &AnomalyConfig::default(),
        );
        let gap = report
            .anomalies
            .iter()
            .find(|a| a.kind == AnomalyKind::CompletenessGap)
            .expect("gap anomaly");
        assert_eq!(gap.affected_categories, vec!["a".to_string()]);
    }

    #[test]
    fn test_summary_counts() {
        let report = analyze_scoring(
            &output(&[("a", 60.0, 4), ("b", 62.0, 4)]),
            &AnomalyConfig::default(),
        );
        assert!(report.summary.starts_with("2 categories"));
    }
}
