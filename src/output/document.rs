//! Deliverable assembly: takes the flat list of adapted fragments produced
//! by the reports phase and writes one markdown document per deliverable
//! that received content.
//!
//! Assembly is deterministic: deliverables render in their canonical order,
//! sections in first-appearance order, and fragments within a section in
//! priority order with arrival order breaking ties.

use crate::error::OutputError;
use crate::registry::{Deliverable, InsertionPoint, Priority};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One adapted piece of content, addressed to a section of a deliverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub deliverable: Deliverable,
    pub section: String,
    pub priority: Priority,
    pub insertion_point: InsertionPoint,
    /// Content-addressed id; duplicate fingerprints collapse at assembly.
    pub fingerprint: String,
    pub body: String,
}

/// A written deliverable file plus enough metadata for the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentArtifact {
    pub deliverable: Deliverable,
    pub path: PathBuf,
    pub sections: usize,
    pub fragments: usize,
}

/// Stable short id for a fragment. Two fragments with the same source type,
/// destination, and body always collide, which is how re-runs stay
/// idempotent.
pub fn fragment_fingerprint(
    content_type: &str,
    deliverable: &str,
    section: &str,
    body: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_type.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(deliverable.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(section.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..12].to_string()
}

struct SectionBuild<'a> {
    name: &'a str,
    members: Vec<&'a Fragment>,
}

/// Group fragments into documents and write them under `output_dir`.
/// Deliverables that received no fragments produce no file.
pub fn write_documents(
    output_dir: &Path,
    company_name: &str,
    fragments: &[Fragment],
) -> Result<Vec<DocumentArtifact>, OutputError> {
    fs::create_dir_all(output_dir).map_err(OutputError::CreateDir)?;

    let mut artifacts = Vec::new();
    for deliverable in Deliverable::ALL {
        let sections = assemble_sections(deliverable, fragments);
        if sections.is_empty() {
            continue;
        }

        let body = render_document(deliverable, company_name, &sections);
        let path = output_dir.join(deliverable.file_name());
        fs::write(&path, body).map_err(OutputError::WriteDocument)?;

        let fragment_count: usize = sections.iter().map(|s| s.members.len()).sum();
        debug!(
            deliverable = %deliverable,
            sections = sections.len(),
            fragments = fragment_count,
            "wrote deliverable"
        );
        artifacts.push(DocumentArtifact {
            deliverable,
            path,
            sections: sections.len(),
            fragments: fragment_count,
        });
    }

    info!(documents = artifacts.len(), "report assembly complete");
    Ok(artifacts)
}

/// Build this deliverable's sections in first-appearance order, honoring
/// each fragment's insertion point and dropping fingerprint duplicates.
fn assemble_sections<'a>(
    deliverable: Deliverable,
    fragments: &'a [Fragment],
) -> Vec<SectionBuild<'a>> {
    let mut sections: Vec<SectionBuild<'a>> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for fragment in fragments.iter().filter(|f| f.deliverable == deliverable) {
        if seen.contains(&fragment.fingerprint.as_str()) {
            continue;
        }
        seen.push(&fragment.fingerprint);

        let idx = match sections.iter().position(|s| s.name == fragment.section) {
            Some(idx) => idx,
            None => {
                sections.push(SectionBuild {
                    name: &fragment.section,
                    members: Vec::new(),
                });
                sections.len() - 1
            }
        };
        let section = &mut sections[idx];

        match fragment.insertion_point {
            InsertionPoint::Within | InsertionPoint::After => section.members.push(fragment),
            InsertionPoint::Replace => {
                section.members.clear();
                section.members.push(fragment);
            }
        }
    }

    // Priority order within a section; stable sort keeps arrival order for
    // equal priorities. `After` fragments sink below everything else.
    for section in &mut sections {
        section.members.sort_by_key(|f| {
            let late = matches!(f.insertion_point, InsertionPoint::After);
            (late, f.priority.rank())
        });
    }
    sections
}

fn render_document(
    deliverable: Deliverable,
    company_name: &str,
    sections: &[SectionBuild<'_>],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}: {}\n\n", deliverable.title(), company_name));
    for section in sections {
        out.push_str(&format!("## {}\n\n", humanize(section.name)));
        for fragment in &section.members {
            out.push_str(&format!("<!-- fragment {} -->\n", fragment.fingerprint));
            out.push_str(&fragment.body);
            out.push_str("\n\n");
        }
    }
    out
}

/// "key-risks" -> "Key risks".
fn humanize(slug: &str) -> String {
    let spaced = slug.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}
