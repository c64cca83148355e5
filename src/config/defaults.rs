use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

pub fn default_cost_per_1k_tokens() -> f64 {
    0.003
}

pub fn default_outlier_z() -> f64 {
    2.0
}

pub fn default_variance_ceiling() -> f64 {
    25.0
}

pub fn default_min_answered() -> usize {
    3
}

pub fn default_true() -> bool {
    true
}
