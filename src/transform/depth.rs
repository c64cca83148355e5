//! Depth transformer: fit a content body into a target word/structure
//! budget using extractive condensation, never generation.

use super::sentence::{score_sentences, select_sentences};
use crate::content::markup;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DepthLevel {
    Headline,
    Summary,
    Standard,
    Detailed,
}

impl DepthLevel {
    pub fn max_words(&self) -> Option<usize> {
        match self {
            DepthLevel::Headline => Some(15),
            DepthLevel::Summary => Some(50),
            DepthLevel::Standard => Some(150),
            DepthLevel::Detailed => None,
        }
    }

    pub fn max_sentences(&self) -> Option<usize> {
        match self {
            DepthLevel::Headline => Some(1),
            DepthLevel::Summary => Some(3),
            DepthLevel::Standard => Some(10),
            DepthLevel::Detailed => None,
        }
    }

    pub fn preserve_structure(&self) -> bool {
        matches!(self, DepthLevel::Standard | DepthLevel::Detailed)
    }

    pub fn keep_visuals(&self) -> bool {
        matches!(self, DepthLevel::Standard | DepthLevel::Detailed)
    }

    pub fn keep_details(&self) -> bool {
        matches!(self, DepthLevel::Detailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevel::Headline => "headline",
            DepthLevel::Summary => "summary",
            DepthLevel::Standard => "standard",
            DepthLevel::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for DepthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DepthLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "headline" => Ok(DepthLevel::Headline),
            "summary" => Ok(DepthLevel::Summary),
            "standard" => Ok(DepthLevel::Standard),
            "detailed" => Ok(DepthLevel::Detailed),
            _ => Err(format!("Unknown depth level: {}", s)),
        }
    }
}

/// Condense `content` to fit `level`, wrapping the result in a depth-tagged
/// container for downstream styling. `Detailed` passes the body through
/// untouched apart from the wrapper.
pub fn transform_depth(content: &str, level: DepthLevel) -> String {
    if level == DepthLevel::Detailed {
        return wrap(content, level);
    }

    // Level-specific stripping happens before condensation so dropped
    // visuals and detail blocks never count against the budget.
    let mut working = content.to_string();
    if !level.keep_visuals() {
        working = markup::strip_visuals(&working);
    }
    if !level.keep_details() {
        working = markup::strip_details(&working);
    }

    let plain = markup::strip_tags(&working);
    let max_words = level.max_words().unwrap_or(usize::MAX);

    let body = if markup::word_count(&plain) <= max_words {
        // Already fits; skip condensation entirely.
        if level.preserve_structure() {
            working.trim().to_string()
        } else {
            plain
        }
    } else {
        match level {
            DepthLevel::Headline => condense_headline(&working, &plain, max_words),
            DepthLevel::Summary => condense_sentences(&plain, level, max_words),
            DepthLevel::Standard => condense_structured(&working, &plain, level, max_words),
            DepthLevel::Detailed => unreachable!("detailed never condenses"),
        }
    };

    wrap(&body, level)
}

/// Headline: heading text, else first emphasized span, else first sentence;
/// truncated to the ceiling with an ellipsis marker.
fn condense_headline(working: &str, plain: &str, max_words: usize) -> String {
    let source = markup::first_heading(working)
        .or_else(|| markup::first_emphasis(working))
        .or_else(|| markup::split_sentences(plain).into_iter().next())
        .unwrap_or_else(|| plain.to_string());

    markup::truncate_words(&source, max_words)
}

fn condense_sentences(plain: &str, level: DepthLevel, max_words: usize) -> String {
    let sentences = markup::split_sentences(plain);
    if sentences.len() <= 1 {
        // No sentence boundaries: degenerate to first-N-words truncation.
        return markup::truncate_words(plain, max_words);
    }

    let max_sentences = level.max_sentences().unwrap_or(usize::MAX);
    let scored = score_sentences(&sentences);
    let picked = select_sentences(&scored, max_sentences, max_words);
    if picked.is_empty() {
        // Even the best sentence overflows; truncate it instead.
        return markup::truncate_words(&sentences[0], max_words);
    }

    join_paragraphs(picked.iter().map(|s| s.text.as_str()), level)
}

/// Structure-preserving condensation: retain whole elements in priority
/// order (headings, emphasized paragraphs, list items, paragraphs) up to
/// the word budget, truncating the last retained element rather than
/// dropping it.
fn condense_structured(working: &str, plain: &str, level: DepthLevel, max_words: usize) -> String {
    let elements = markup::collect_elements(working);
    if elements.is_empty() {
        return condense_sentences(plain, level, max_words);
    }

    let mut by_rank: Vec<usize> = (0..elements.len()).collect();
    by_rank.sort_by_key(|&i| (elements[i].kind.rank(), elements[i].pos));

    let mut kept: Vec<(usize, String)> = Vec::new();
    let mut words_used = 0usize;

    for i in by_rank {
        let element = &elements[i];
        if words_used >= max_words {
            break;
        }
        if words_used + element.words <= max_words {
            words_used += element.words;
            kept.push((element.pos, element.raw.clone()));
        } else {
            // Overflowing element: keep a truncated rendering and stop.
            let remaining = max_words - words_used;
            let text = markup::truncate_words(&element.text, remaining);
            let tag = element.kind.tag();
            kept.push((element.pos, format!("<{}>{}</{}>", tag, text, tag)));
            break;
        }
    }

    kept.sort_by_key(|(pos, _)| *pos);
    kept.into_iter()
        .map(|(_, raw)| raw)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join selected sentences into output paragraphs; `standard` groups up to
/// three sentences per paragraph, shallower levels emit one block.
fn join_paragraphs<'a>(sentences: impl Iterator<Item = &'a str>, level: DepthLevel) -> String {
    let sentences: Vec<&str> = sentences.collect();
    if level == DepthLevel::Standard {
        sentences
            .chunks(3)
            .map(|chunk| chunk.join(" "))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        sentences.join(" ")
    }
}

fn wrap(body: &str, level: DepthLevel) -> String {
    format!("<div class=\"depth-{}\">{}</div>", level.as_str(), body)
}

/// Word count of the rendered body, ignoring the wrapper and any markup.
pub fn rendered_word_count(output: &str) -> usize {
    markup::word_count(&markup::strip_tags(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_narrative() -> String {
        let mut body = String::from(
            "<h3>Customer concentration risk</h3>\
             <p>A single customer accounts for <strong>62% of revenue</strong>, which is a critical exposure.</p>",
        );
        for i in 0..40 {
            body.push_str(&format!(
                "<p>Additional context paragraph number {} explains the situation in more ordinary words.</p>",
                i
            ));
        }
        body.push_str("<figure><img src=\"chart.png\"></figure>");
        body.push_str("<details>Supplementary methodology notes live here.</details>");
        body
    }

    #[test]
    fn test_headline_prefers_heading_and_fits() {
        let out = transform_depth(&long_narrative(), DepthLevel::Headline);
        assert!(out.contains("Customer concentration risk"));
        assert!(rendered_word_count(&out) <= 15);
        assert!(out.starts_with("<div class=\"depth-headline\">"));
    }

    #[test]
    fn test_headline_falls_back_to_first_sentence_with_ellipsis() {
        let body = format!("<p>{} tail.</p>", "word ".repeat(30));
        let out = transform_depth(&body, DepthLevel::Headline);
        assert!(rendered_word_count(&out) <= 15);
        assert!(out.contains("..."));
    }

    #[test]
    fn test_summary_respects_word_ceiling() {
        let out = transform_depth(&long_narrative(), DepthLevel::Summary);
        assert!(rendered_word_count(&out) <= 50);
    }

    #[test]
    fn test_standard_keeps_structure_and_ceiling() {
        let out = transform_depth(&long_narrative(), DepthLevel::Standard);
        assert!(rendered_word_count(&out) <= 150);
        // Heading and emphasized paragraph are retained in document order.
        let h = out.find("Customer concentration risk").unwrap();
        let p = out.find("62% of revenue").unwrap();
        assert!(h < p);
        assert!(out.contains("<h3>"));
        // Detail blocks are stripped at standard depth, visuals kept.
        assert!(!out.contains("methodology"));
    }

    #[test]
    fn test_detailed_is_passthrough_modulo_wrapper() {
        let body = long_narrative();
        let out = transform_depth(&body, DepthLevel::Detailed);
        assert_eq!(out, format!("<div class=\"depth-detailed\">{}</div>", body));
    }

    #[test]
    fn test_short_body_never_padded_and_idempotent_at_ceiling() {
        let body = "<p>Short and already within budget.</p>";
        let once = transform_depth(body, DepthLevel::Summary);
        assert_eq!(rendered_word_count(&once), 5);
        let twice = transform_depth(&once, DepthLevel::Summary);
        assert_eq!(rendered_word_count(&twice), rendered_word_count(&once));
    }

    #[test]
    fn test_no_sentence_boundaries_degenerates_to_truncation() {
        let body = "word ".repeat(80);
        let out = transform_depth(&body, DepthLevel::Summary);
        assert!(rendered_word_count(&out) <= 50);
        assert!(out.contains("..."));
    }

    #[test]
    fn test_deeper_levels_never_shorter() {
        let body = long_narrative();
        let headline = rendered_word_count(&transform_depth(&body, DepthLevel::Headline));
        let summary = rendered_word_count(&transform_depth(&body, DepthLevel::Summary));
        let standard = rendered_word_count(&transform_depth(&body, DepthLevel::Standard));
        let detailed = rendered_word_count(&transform_depth(&body, DepthLevel::Detailed));
        assert!(headline <= summary);
        assert!(summary <= standard);
        assert!(standard <= detailed);
    }

    #[test]
    fn test_fits_skips_condensation() {
        let body = "<p>Five words fit easily here.</p>";
        let standard = transform_depth(body, DepthLevel::Standard);
        assert!(standard.contains("<p>"));
        let summary = transform_depth(body, DepthLevel::Summary);
        assert!(!summary.contains("<p>"));
    }
}
