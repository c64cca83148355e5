//! Built-in registry table. Overridable wholesale with `--registry`, so a
//! new report variant is a data change, not a code change.

use super::{
    Deliverable, InsertionPoint, IntegrationStrategy, Priority, Registry, RegistryEntry,
    TargetMapping,
};
use crate::transform::{DepthLevel, Voice};

fn mapping(
    deliverable: Deliverable,
    target_section: &str,
    priority: Priority,
    target_voice: Voice,
    target_depth: DepthLevel,
    max_items: Option<usize>,
    insertion_point: InsertionPoint,
) -> TargetMapping {
    TargetMapping {
        deliverable,
        target_section: target_section.to_string(),
        priority,
        target_voice,
        target_depth,
        max_items,
        insertion_point,
        transformation_guidance: None,
    }
}

impl Default for Registry {
    fn default() -> Self {
        use Deliverable::*;
        use DepthLevel::*;
        use InsertionPoint::*;
        use Priority::*;
        use Voice as V;

        let entries = vec![
            RegistryEntry {
                content_type: "risk".to_string(),
                source: "risks".to_string(),
                integration_strategy: IntegrationStrategy::Transform,
                extractor: "risks".to_string(),
                target_mappings: vec![
                    mapping(Owner, "key-risks", Critical, V::Owner, Standard, Some(5), Within),
                    mapping(ExecutiveBrief, "risk-overview", High, V::Executive, Summary, Some(3), Within),
                    mapping(ManagerPlaybook, "watch-items", Medium, V::Manager, Summary, Some(4), Within),
                    mapping(Comprehensive, "risk-register", High, V::Owner, Detailed, None, Within),
                ],
            },
            RegistryEntry {
                content_type: "recommendation".to_string(),
                source: "recommendations".to_string(),
                integration_strategy: IntegrationStrategy::Transform,
                extractor: "recommendations".to_string(),
                target_mappings: vec![
                    mapping(Owner, "top-priorities", Critical, V::Owner, Standard, Some(5), Within),
                    mapping(ExecutiveBrief, "strategic-recommendations", High, V::Executive, Summary, Some(3), Within),
                    mapping(ManagerPlaybook, "initiatives", High, V::Manager, Standard, Some(5), Within),
                    mapping(EmployeeGuide, "how-you-can-help", Medium, V::Employee, Summary, Some(3), Within),
                    mapping(Comprehensive, "recommendations", High, V::Owner, Detailed, None, Within),
                ],
            },
            RegistryEntry {
                content_type: "quick_win".to_string(),
                source: "recommendations".to_string(),
                integration_strategy: IntegrationStrategy::Transform,
                extractor: "quick_wins".to_string(),
                target_mappings: vec![
                    mapping(Owner, "quick-wins", High, V::Owner, Summary, Some(3), Within),
                    mapping(ManagerPlaybook, "initiatives", Medium, V::Manager, Summary, Some(3), After),
                    mapping(EmployeeGuide, "whats-changing", Medium, V::Employee, Headline, Some(3), Within),
                ],
            },
            RegistryEntry {
                content_type: "roadmap_phase".to_string(),
                source: "roadmap".to_string(),
                integration_strategy: IntegrationStrategy::Transform,
                extractor: "roadmap_phases".to_string(),
                target_mappings: vec![
                    mapping(Owner, "your-roadmap", High, V::Owner, Standard, None, Within),
                    mapping(ManagerPlaybook, "rollout-plan", High, V::Manager, Standard, None, Within),
                    mapping(EmployeeGuide, "whats-changing", Low, V::Employee, Summary, Some(2), After),
                    mapping(Comprehensive, "roadmap", Medium, V::Owner, Detailed, None, Within),
                ],
            },
            RegistryEntry {
                content_type: "financial_metric".to_string(),
                source: "roadmap".to_string(),
                integration_strategy: IntegrationStrategy::Transform,
                extractor: "financial_metrics".to_string(),
                target_mappings: vec![
                    mapping(Owner, "financial-snapshot", High, V::Owner, Summary, Some(4), Within),
                    mapping(ExecutiveBrief, "financial-highlights", Critical, V::Executive, Headline, Some(3), Within),
                    mapping(Comprehensive, "financial-detail", Medium, V::Owner, Detailed, None, Within),
                ],
            },
        ];

        Registry { entries }
    }
}
