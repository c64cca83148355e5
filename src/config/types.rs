use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;
use crate::pipeline::PhaseName;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Optional registry table override; built-in table when absent.
    #[serde(default)]
    pub registry_file: Option<PathBuf>,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub anomaly: AnomalyConfig,

    #[serde(default)]
    pub phases: PhaseFlags,
}

/// Explicit pricing knobs, injected into cost accounting so alternate
/// pricing is a config (or test) concern, not a recompile.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct PricingConfig {
    #[serde(default = "default_cost_per_1k_tokens")]
    pub cost_per_1k_tokens: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cost_per_1k_tokens: default_cost_per_1k_tokens(),
        }
    }
}

/// Thresholds for the post-phase anomaly detectors.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct AnomalyConfig {
    /// |z-score| above which a category score is an outlier.
    #[serde(default = "default_outlier_z")]
    pub outlier_z: f64,

    /// Standard deviation above which score spread is flagged.
    #[serde(default = "default_variance_ceiling")]
    pub variance_ceiling: f64,

    /// Categories answered by fewer responses than this are gaps.
    #[serde(default = "default_min_answered")]
    pub min_answered: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            outlier_z: default_outlier_z(),
            variance_ceiling: default_variance_ceiling(),
            min_answered: default_min_answered(),
        }
    }
}

/// Static phase enablement flags. No dynamic reconfiguration at runtime:
/// a disabled phase is skipped for the whole run.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct PhaseFlags {
    #[serde(default = "default_true")]
    pub scoring: bool,

    #[serde(default = "default_true")]
    pub categories: bool,

    #[serde(default = "default_true")]
    pub risks: bool,

    #[serde(default = "default_true")]
    pub recommendations: bool,

    #[serde(default = "default_true")]
    pub roadmap: bool,

    #[serde(default = "default_true")]
    pub reports: bool,
}

impl Default for PhaseFlags {
    fn default() -> Self {
        Self {
            scoring: true,
            categories: true,
            risks: true,
            recommendations: true,
            roadmap: true,
            reports: true,
        }
    }
}

impl PhaseFlags {
    pub fn enabled(&self, phase: PhaseName) -> bool {
        match phase {
            PhaseName::Scoring => self.scoring,
            PhaseName::Categories => self.categories,
            PhaseName::Risks => self.risks,
            PhaseName::Recommendations => self.recommendations,
            PhaseName::Roadmap => self.roadmap,
            PhaseName::Reports => self.reports,
        }
    }
}
