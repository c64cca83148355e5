mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            output_dir: default_output_dir(),
            registry_file: None,
            pricing: PricingConfig::default(),
            anomaly: AnomalyConfig::default(),
            phases: PhaseFlags::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pricing.cost_per_1k_tokens.is_finite() || self.pricing.cost_per_1k_tokens < 0.0 {
            return Err(ConfigError::InvalidPricing(self.pricing.cost_per_1k_tokens));
        }

        if self.anomaly.outlier_z <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "outlier_z",
                value: self.anomaly.outlier_z,
            });
        }
        if self.anomaly.variance_ceiling <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "variance_ceiling",
                value: self.anomaly.variance_ceiling,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing.cost_per_1k_tokens, 0.003);
        assert!(config.phases.reports);
    }

    #[test]
    fn test_invalid_pricing_rejected() {
        let mut config = Config::default();
        config.pricing.cost_per_1k_tokens = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "output_dir: out\nphases:\n  reports: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output_dir, std::path::PathBuf::from("out"));
        assert!(!config.phases.reports);
        assert!(config.phases.scoring);
        assert_eq!(config.anomaly.min_answered, 3);
    }
}
