use crate::error::InputError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Allowed band for the number of responses in one submission.
pub const MIN_RESPONSES: usize = 10;
pub const MAX_RESPONSES: usize = 500;

/// Question ids every submission must answer before the pipeline starts.
pub const REQUIRED_QUESTIONS: [&str; 4] =
    ["q_revenue", "q_employees", "q_industry", "q_primary_goal"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInput {
    pub submission_id: String,

    pub company_name: String,

    #[serde(default)]
    pub industry: Option<String>,

    pub responses: Vec<AssessmentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub question_id: String,

    /// Scoring category this question belongs to (e.g. "finance").
    pub category: String,

    /// Numeric answer on a 0-10 scale, when the question is scored.
    #[serde(default)]
    pub value: Option<f64>,

    /// Free-text answer, when present.
    #[serde(default)]
    pub answer: Option<String>,
}

impl AssessmentInput {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path).map_err(|e| InputError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let input: AssessmentInput = serde_json::from_str(&content)?;
        Ok(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Pure structural pre-flight check over the untyped submission record.
/// Runs before the orchestrator; a failing report means the pipeline must
/// not start.
pub fn preflight(raw: &Value) -> PreflightReport {
    let mut errors = Vec::new();

    match raw.get("submissionId").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => {}
        _ => errors.push("submissionId is missing or empty".to_string()),
    }

    match raw.get("companyName").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => errors.push("companyName is missing or empty".to_string()),
    }

    match raw.get("responses") {
        Some(Value::Array(responses)) => {
            if responses.len() < MIN_RESPONSES || responses.len() > MAX_RESPONSES {
                errors.push(format!(
                    "response count {} outside allowed band [{}, {}]",
                    responses.len(),
                    MIN_RESPONSES,
                    MAX_RESPONSES
                ));
            }

            let answered: Vec<&str> = responses
                .iter()
                .filter_map(|r| r.get("questionId").and_then(Value::as_str))
                .collect();
            for required in REQUIRED_QUESTIONS {
                if !answered.contains(&required) {
                    errors.push(format!("required question '{}' is missing", required));
                }
            }
        }
        _ => errors.push("responses is missing or not an array".to_string()),
    }

    PreflightReport {
        valid: errors.is_empty(),
        errors,
    }
}
