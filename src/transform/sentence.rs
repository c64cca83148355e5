//! Sentence scoring for extractive condensation.
//!
//! The weights are tuned values carried over unchanged; treat any change
//! here as a behavior change needing sign-off.

use crate::content::markup::word_count;
use regex::Regex;

/// Words whose presence marks a sentence as carrying load-bearing content.
/// One point per marker that appears, however many times it appears.
const IMPORTANCE_MARKERS: &[&str] = &[
    // urgency / priority
    "urgent",
    "critical",
    "immediately",
    "priority",
    "deadline",
    // modal obligation
    "must",
    "should",
    "need",
    "required",
    "essential",
    // risk / opportunity vocabulary
    "risk",
    "opportunity",
    "threat",
    "growth",
    "loss",
    "savings",
    "revenue",
    "cost",
];

#[derive(Debug, Clone)]
pub struct ScoredSentence {
    pub index: usize,
    pub text: String,
    pub words: usize,
    pub score: i32,
}

/// Score each sentence for extractive selection:
/// +3 first sentence, +1 last, +2 if 10-25 words, -1 under 5 words,
/// -1 over 40 words, +1 per importance marker present, +1 if the sentence
/// carries a numeric or financial figure.
pub fn score_sentences(sentences: &[String]) -> Vec<ScoredSentence> {
    let figure_re = Regex::new(r"[$€£]\s*\d|\d+%|\b\d[\d,.]*\b").ok();
    let last = sentences.len().saturating_sub(1);

    sentences
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let words = word_count(text);
            let mut score = 0i32;

            if index == 0 {
                score += 3;
            }
            if index == last && !sentences.is_empty() {
                score += 1;
            }
            if (10..=25).contains(&words) {
                score += 2;
            }
            if words < 5 {
                score -= 1;
            }
            if words > 40 {
                score -= 1;
            }

            let lower = text.to_lowercase();
            for marker in IMPORTANCE_MARKERS {
                if contains_word(&lower, marker) {
                    score += 1;
                }
            }
            if let Some(re) = &figure_re {
                if re.is_match(text) {
                    score += 1;
                }
            }

            ScoredSentence {
                index,
                text: text.clone(),
                words,
                score,
            }
        })
        .collect()
}

/// Greedily pick the highest-scoring sentences under both the sentence cap
/// and the word ceiling, then restore original textual order.
pub fn select_sentences(
    scored: &[ScoredSentence],
    max_sentences: usize,
    max_words: usize,
) -> Vec<ScoredSentence> {
    let mut by_score: Vec<&ScoredSentence> = scored.iter().collect();
    by_score.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));

    let mut picked: Vec<ScoredSentence> = Vec::new();
    let mut words_used = 0usize;

    for sentence in by_score {
        if picked.len() >= max_sentences {
            break;
        }
        if words_used + sentence.words > max_words {
            continue;
        }
        words_used += sentence.words;
        picked.push(sentence.clone());
    }

    picked.sort_by_key(|s| s.index);
    picked
}

fn contains_word(haystack_lower: &str, word: &str) -> bool {
    haystack_lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}
