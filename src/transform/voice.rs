//! Voice transformer: rewrite lexical surface form for one of four fixed
//! audience profiles, independent of depth.

use crate::content::ContentType;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Owner,
    Executive,
    Manager,
    Employee,
}

impl Voice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Owner => "owner",
            Voice::Executive => "executive",
            Voice::Manager => "manager",
            Voice::Employee => "employee",
        }
    }

    fn profile(&self) -> &'static VoiceProfile {
        match self {
            Voice::Owner => &OWNER,
            Voice::Executive => &EXECUTIVE,
            Voice::Manager => &MANAGER,
            Voice::Employee => &EMPLOYEE,
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Voice::Owner),
            "executive" => Ok(Voice::Executive),
            "manager" => Ok(Voice::Manager),
            "employee" => Ok(Voice::Employee),
            _ => Err(format!("Unknown voice: {}", s)),
        }
    }
}

struct VoiceProfile {
    /// Ordered whole-phrase find/replace rules, applied case-insensitively.
    replacements: &'static [(&'static str, &'static str)],
    /// Terms bolded on first occurrence only.
    emphasis_terms: &'static [&'static str],
    #[allow(dead_code)]
    tone: &'static str,
    /// Leading emphasized prefix for actionable content, if any.
    action_prefix: Option<&'static str>,
    /// Closing sentence appended to recommendations, if any.
    call_to_action: Option<&'static str>,
}

static OWNER: VoiceProfile = VoiceProfile {
    replacements: &[
        ("the organization", "your business"),
        ("stakeholders", "you and your customers"),
        ("personnel", "your people"),
        ("capital expenditure", "upfront investment"),
        ("utilize", "use"),
    ],
    emphasis_terms: &["revenue", "profit", "cash flow", "growth"],
    tone: "direct",
    action_prefix: Some("Action:"),
    call_to_action: Some("Schedule time this week to put this into motion."),
};

static EXECUTIVE: VoiceProfile = VoiceProfile {
    replacements: &[
        ("a lot of", "significant"),
        ("help", "enable"),
        ("quickly", "in the near term"),
        ("your business", "the business"),
    ],
    emphasis_terms: &["ROI", "margin", "strategic", "competitive advantage"],
    tone: "concise",
    action_prefix: None,
    call_to_action: None,
};

static MANAGER: VoiceProfile = VoiceProfile {
    replacements: &[
        ("the organization", "your team"),
        ("employees", "team members"),
        ("implement", "roll out"),
        ("oversee", "coordinate"),
    ],
    emphasis_terms: &["team", "process", "efficiency", "workflow"],
    tone: "operational",
    action_prefix: Some("Team action:"),
    call_to_action: Some("Review this with your team at your next check-in."),
};

static EMPLOYEE: VoiceProfile = VoiceProfile {
    replacements: &[
        ("the organization", "we"),
        ("employees", "you and your colleagues"),
        ("management", "your leads"),
        ("strategy", "plan"),
    ],
    emphasis_terms: &["training", "support", "tools", "day-to-day"],
    tone: "supportive",
    action_prefix: Some("What this means for you:"),
    call_to_action: None,
};

/// Rewrite `content` from `source` voice (neutral when `None`) to `target`.
///
/// Replacement rules target full phrases and emphasis insertion is guarded
/// to fire once, so re-applying the same target voice is near-idempotent.
pub fn transform_voice(
    content: &str,
    target: Voice,
    source: Option<Voice>,
    content_type: ContentType,
) -> String {
    let profile = target.profile();
    let mut text = content.to_string();

    // 1. Phrase replacements.
    for (pattern, replacement) in profile.replacements {
        if let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(pattern))) {
            text = re.replace_all(&text, *replacement).into_owned();
        }
    }

    // 2. Un-bold emphasis belonging to the source voice but not this one.
    if let Some(source) = source {
        if source != target {
            for term in source.profile().emphasis_terms {
                if profile
                    .emphasis_terms
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(term))
                {
                    continue;
                }
                let pattern = format!(
                    r"(?i)<(?:strong|b)\b[^>]*>\s*({})\s*</(?:strong|b)>",
                    regex::escape(term)
                );
                if let Ok(re) = Regex::new(&pattern) {
                    text = re.replace_all(&text, "$1").into_owned();
                }
            }
        }
    }

    // 3. Voice-specific tone smoothing.
    text = smooth_tone(&text, target);

    // 4. Bold the first occurrence of each emphasis term not already
    //    inside emphasis markup.
    for term in profile.emphasis_terms {
        text = bold_first(&text, term);
    }

    // 5. Action prefix for actionable content.
    if let Some(prefix) = profile.action_prefix {
        if content_type.is_actionable() && !has_action_prefix(&text) {
            text = insert_action_prefix(&text, prefix);
        }
    }

    // 6. Call to action, recommendations only.
    if let Some(cta) = profile.call_to_action {
        if content_type == ContentType::Recommendation && !text.contains(cta) {
            text = append_cta(&text, cta);
        }
    }

    text
}

fn smooth_tone(text: &str, target: Voice) -> String {
    match target {
        Voice::Executive => {
            // Strip throat-clearing openers, re-capitalizing what follows.
            let pattern = r"(?i)\b(?:it should be noted that|it is important to note that|it is worth mentioning that|please note that)\s+(\w)";
            match Regex::new(pattern) {
                Ok(re) => re
                    .replace_all(text, |caps: &regex::Captures| caps[1].to_uppercase())
                    .into_owned(),
                Err(_) => text.to_string(),
            }
        }
        Voice::Employee => {
            let mut out = text.to_string();
            for (pattern, replacement) in [
                ("must", "let's"),
                ("problems", "challenges"),
                ("problem", "challenge"),
                ("failure", "setback"),
                ("weakness", "growth area"),
            ] {
                out = replace_word_preserving_case(&out, pattern, replacement);
            }
            out
        }
        Voice::Owner | Voice::Manager => text.to_string(),
    }
}

/// Case-insensitive word replacement that keeps a leading capital.
fn replace_word_preserving_case(text: &str, word: &str, replacement: &str) -> String {
    let re = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    re.replace_all(text, |caps: &regex::Captures| {
        let matched = &caps[0];
        if matched.chars().next().is_some_and(|c| c.is_uppercase()) {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        } else {
            replacement.to_string()
        }
    })
    .into_owned()
}

/// Bold the first occurrence of `term` that sits outside tags and outside
/// existing emphasis markup. Never fires twice for the same term.
fn bold_first(text: &str, term: &str) -> String {
    let term_re = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    let emphasized: Vec<(usize, usize)> =
        match Regex::new(r"(?is)<(?:strong|b)\b[^>]*>.*?</(?:strong|b)>") {
            Ok(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            Err(_) => Vec::new(),
        };
    let tags: Vec<(usize, usize)> = match Regex::new(r"<[^>]*>") {
        Ok(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        Err(_) => Vec::new(),
    };

    let inside = |start: usize, end: usize, spans: &[(usize, usize)]| {
        spans.iter().any(|&(s, e)| start >= s && end <= e)
    };

    for m in term_re.find_iter(text) {
        if inside(m.start(), m.end(), &emphasized) {
            // Already emphasized somewhere: the guard is satisfied.
            return text.to_string();
        }
        if inside(m.start(), m.end(), &tags) {
            continue;
        }
        let mut out = String::with_capacity(text.len() + 17);
        out.push_str(&text[..m.start()]);
        out.push_str("<strong>");
        out.push_str(m.as_str());
        out.push_str("</strong>");
        out.push_str(&text[m.end()..]);
        return out;
    }

    text.to_string()
}

fn has_action_prefix(text: &str) -> bool {
    let plain = crate::content::markup::strip_tags(text);
    [OWNER.action_prefix, MANAGER.action_prefix, EMPLOYEE.action_prefix]
        .iter()
        .flatten()
        .any(|prefix| plain.starts_with(prefix))
}

/// Insert the prefix as leading emphasized text in the first
/// paragraph-equivalent block.
fn insert_action_prefix(text: &str, prefix: &str) -> String {
    let emphasized = format!("<strong>{}</strong> ", prefix);

    if let Ok(re) = Regex::new(r"(?is)<p[^>]*>") {
        if let Some(m) = re.find(text) {
            let mut out = String::with_capacity(text.len() + emphasized.len());
            out.push_str(&text[..m.end()]);
            out.push_str(&emphasized);
            out.push_str(&text[m.end()..]);
            return out;
        }
    }

    if let Ok(re) = Regex::new(r"(?is)^\s*<div[^>]*>") {
        if let Some(m) = re.find(text) {
            let mut out = String::with_capacity(text.len() + emphasized.len());
            out.push_str(&text[..m.end()]);
            out.push_str(&emphasized);
            out.push_str(&text[m.end()..]);
            return out;
        }
    }

    format!("{}{}", emphasized, text)
}

fn append_cta(text: &str, cta: &str) -> String {
    let trimmed = text.trim_end();
    if let Some(stripped) = trimmed.strip_suffix("</div>") {
        format!("{} <p>{}</p></div>", stripped.trim_end(), cta)
    } else {
        format!("{} {}", trimmed, cta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_replacements_and_emphasis() {
        let out = transform_voice(
            "<p>The organization needs steady revenue to fund growth.</p>",
            Voice::Owner,
            None,
            ContentType::RoadmapPhase,
        );
        assert!(out.contains("your business"));
        assert!(!out.to_lowercase().contains("the organization"));
        assert!(out.contains("<strong>revenue</strong>"));
        assert!(out.contains("<strong>growth</strong>"));
    }

    #[test]
    fn test_emphasis_fires_once() {
        let input = "<p>Revenue today, revenue tomorrow, revenue forever.</p>";
        let once = transform_voice(input, Voice::Owner, None, ContentType::FinancialMetric);
        assert_eq!(once.matches("<strong>").count(), 1);
        let twice = transform_voice(&once, Voice::Owner, None, ContentType::FinancialMetric);
        assert_eq!(twice.matches("<strong>").count(), 1);
    }

    #[test]
    fn test_cross_voice_neutralization() {
        let input = "<p>Steady <strong>revenue</strong> supports the plan.</p>";
        let out = transform_voice(input, Voice::Executive, Some(Voice::Owner), ContentType::Risk);
        // Owner's emphasis is removed; the word survives.
        assert!(!out.contains("<strong>revenue</strong>"));
        assert!(out.contains("revenue"));
    }

    #[test]
    fn test_executive_strips_throat_clearing() {
        let out = transform_voice(
            "<p>It should be noted that margins are compressed.</p>",
            Voice::Executive,
            None,
            ContentType::Risk,
        );
        assert!(!out.to_lowercase().contains("it should be noted"));
        assert!(out.contains("Margins are compressed."));
    }

    #[test]
    fn test_employee_softens_obligation() {
        let out = transform_voice(
            "<p>We must fix this problem before it becomes a failure.</p>",
            Voice::Employee,
            None,
            ContentType::RoadmapPhase,
        );
        assert!(out.contains("let's"));
        assert!(out.contains("challenge"));
        assert!(out.contains("setback"));
        assert!(!out.contains("must"));
        assert!(!out.contains("problem"));
    }

    #[test]
    fn test_action_prefix_for_actionable_types_only() {
        let rec = transform_voice(
            "<p>Renegotiate supplier contracts.</p>",
            Voice::Owner,
            None,
            ContentType::Recommendation,
        );
        assert!(rec.contains("<strong>Action:</strong>"));

        let metric = transform_voice(
            "<p>Gross margin sits at 31%.</p>",
            Voice::Owner,
            None,
            ContentType::FinancialMetric,
        );
        assert!(!metric.contains("Action:"));
    }

    #[test]
    fn test_action_prefix_not_duplicated() {
        let once = transform_voice(
            "<p>Renegotiate supplier contracts.</p>",
            Voice::Owner,
            None,
            ContentType::Recommendation,
        );
        let twice = transform_voice(&once, Voice::Owner, None, ContentType::Recommendation);
        assert_eq!(twice.matches("Action:").count(), 1);
    }

    #[test]
    fn test_cta_owner_yes_executive_no() {
        let input = "<p>Renegotiate supplier contracts.</p>";
        let owner = transform_voice(input, Voice::Owner, None, ContentType::Recommendation);
        assert_eq!(
            owner
                .matches("Schedule time this week to put this into motion.")
                .count(),
            1
        );
        let exec = transform_voice(input, Voice::Executive, None, ContentType::Recommendation);
        assert!(!exec.contains("Schedule time this week"));
    }

    #[test]
    fn test_cta_only_for_recommendations() {
        let out = transform_voice(
            "<p>Customer concentration is dangerous.</p>",
            Voice::Owner,
            None,
            ContentType::Risk,
        );
        assert!(!out.contains("Schedule time this week"));
    }

    #[test]
    fn test_cta_inserted_inside_depth_wrapper() {
        let input = "<div class=\"depth-summary\"><p>Renegotiate supplier contracts.</p></div>";
        let out = transform_voice(input, Voice::Manager, None, ContentType::Recommendation);
        assert!(out.ends_with("</div>"));
        assert!(out.contains("Review this with your team at your next check-in."));
    }
}
