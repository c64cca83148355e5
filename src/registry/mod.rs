//! The content registry: a static, declarative table mapping each source
//! content type to the destinations its content must be adapted for.
//!
//! Centralizing this as data is what lets a new report variant be added,
//! or content moved between sections, without touching the transformers.

mod table;

use crate::error::RegistryError;
use crate::transform::{DepthLevel, Voice};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Deliverable {
    Owner,
    ExecutiveBrief,
    ManagerPlaybook,
    EmployeeGuide,
    Comprehensive,
}

impl Deliverable {
    pub const ALL: [Deliverable; 5] = [
        Deliverable::Owner,
        Deliverable::ExecutiveBrief,
        Deliverable::ManagerPlaybook,
        Deliverable::EmployeeGuide,
        Deliverable::Comprehensive,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Deliverable::Owner => "owner-report.md",
            Deliverable::ExecutiveBrief => "executive-brief.md",
            Deliverable::ManagerPlaybook => "manager-playbook.md",
            Deliverable::EmployeeGuide => "employee-guide.md",
            Deliverable::Comprehensive => "comprehensive-report.md",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Deliverable::Owner => "Owner Report",
            Deliverable::ExecutiveBrief => "Executive Brief",
            Deliverable::ManagerPlaybook => "Manager Playbook",
            Deliverable::EmployeeGuide => "Employee Guide",
            Deliverable::Comprehensive => "Comprehensive Report",
        }
    }
}

impl std::fmt::Display for Deliverable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deliverable::Owner => write!(f, "owner"),
            Deliverable::ExecutiveBrief => write!(f, "executive_brief"),
            Deliverable::ManagerPlaybook => write!(f, "manager_playbook"),
            Deliverable::EmployeeGuide => write!(f, "employee_guide"),
            Deliverable::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

/// Ordering/inclusion hint for the assembly layer; the transformers never
/// interpret it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// How the assembly layer splices a transformed fragment into its section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsertionPoint {
    #[default]
    Within,
    After,
    Replace,
}

/// One destination for content of a given type. Fully determines the
/// (voice, depth) transformation applied before the fragment reaches it.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TargetMapping {
    pub deliverable: Deliverable,

    pub target_section: String,

    #[serde(default)]
    pub priority: Priority,

    pub target_voice: Voice,

    pub target_depth: DepthLevel,

    #[serde(default)]
    pub max_items: Option<usize>,

    #[serde(default)]
    pub insertion_point: InsertionPoint,

    /// Free-text hint consumed by upstream generation, not by the
    /// transformers.
    #[serde(default)]
    pub transformation_guidance: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStrategy {
    #[default]
    Transform,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RegistryEntry {
    /// Content type key (`risk`, `recommendation`, ...). Lookup is
    /// string-keyed so unknown types degrade to an empty mapping list.
    pub content_type: String,

    /// Which upstream phase artifact this entry describes.
    pub source: String,

    #[serde(default)]
    pub integration_strategy: IntegrationStrategy,

    /// Id resolved against the extractor dispatch table at startup.
    pub extractor: String,

    pub target_mappings: Vec<TargetMapping>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Registry {
    pub entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Load a registry table from a YAML file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let registry: Registry = serde_yaml::from_str(&content)?;
        Ok(registry)
    }

    /// The ordered target mappings for a content type. Unknown types yield
    /// an empty slice: nothing to synthesize yet, never an error.
    pub fn lookup(&self, content_type: &str) -> &[TargetMapping] {
        self.entries
            .iter()
            .find(|e| e.content_type == content_type)
            .map(|e| e.target_mappings.as_slice())
            .unwrap_or(&[])
    }

    /// Check that every entry resolves to a known extractor and carries at
    /// least one mapping.
    pub fn validate(&self, known_extractors: &[&str]) -> Result<(), RegistryError> {
        for entry in &self.entries {
            if !known_extractors.contains(&entry.extractor.as_str()) {
                return Err(RegistryError::UnknownExtractor {
                    content_type: entry.content_type.clone(),
                    extractor: entry.extractor.clone(),
                });
            }
            if entry.target_mappings.is_empty() {
                return Err(RegistryError::EmptyMappings(entry.content_type.clone()));
            }
        }
        Ok(())
    }
}
