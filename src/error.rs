use std::path::PathBuf;
use thiserror::Error;

#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum BriefcraftError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid per-1k-token cost: {0}")]
    InvalidPricing(f64),

    #[error("Invalid anomaly threshold '{name}': {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Input failed pre-flight validation: {0}")]
    Preflight(String),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse registry: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown extractor '{extractor}' referenced by content type '{content_type}'")]
    UnknownExtractor {
        content_type: String,
        extractor: String,
    },

    #[error("Content type '{0}' has no target mappings")]
    EmptyMappings(String),
}

#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("{0}")]
    Failed(String),

    #[error("phase '{phase}' requires output of phase '{needs}'")]
    MissingUpstream {
        phase: &'static str,
        needs: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write document: {0}")]
    WriteDocument(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
