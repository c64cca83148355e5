//! Best-effort helpers over the markup dialect used by generated content.
//!
//! Content bodies are HTML-flavoured fragments (headings, paragraphs,
//! emphasis, lists, figures, collapsible details). Everything here is
//! tolerant regex matching: malformed markup degrades to "leave it alone",
//! never to an error, so a cosmetic rewrite can never block the pipeline.

use regex::Regex;

/// A block-level element pulled out of a markup body, used when a depth
/// level asks for structure-preserving condensation.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub raw: String,
    pub text: String,
    pub words: usize,
    /// Byte offset in the source body, for restoring document order.
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading,
    /// A paragraph carrying emphasis markup (strong/b/em).
    Emphasis,
    ListItem,
    Paragraph,
}

impl ElementKind {
    /// Retention priority for structure-preserving condensation (lower is
    /// kept first).
    pub fn rank(&self) -> u8 {
        match self {
            ElementKind::Heading => 0,
            ElementKind::Emphasis => 1,
            ElementKind::ListItem => 2,
            ElementKind::Paragraph => 3,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Heading => "h3",
            ElementKind::Emphasis | ElementKind::Paragraph => "p",
            ElementKind::ListItem => "li",
        }
    }
}

/// Strip all markup down to plain text: comments and tags removed, a few
/// common entities decoded, whitespace collapsed.
pub fn strip_tags(markup: &str) -> String {
    let no_comments = match Regex::new(r"(?s)<!--.*?-->") {
        Ok(re) => re.replace_all(markup, " ").into_owned(),
        Err(_) => markup.to_string(),
    };

    // Closing block tags become spaces so adjacent blocks don't fuse words.
    let no_tags = match Regex::new(r"(?s)</?[a-zA-Z][^>]*>") {
        Ok(re) => re.replace_all(&no_comments, " ").into_owned(),
        Err(_) => no_comments,
    };

    let decoded = no_tags
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Text of the first heading element, if any.
pub fn first_heading(markup: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").ok()?;
    let caps = re.captures(markup)?;
    let text = strip_tags(caps.get(1)?.as_str());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the first strongly-emphasized span, if any.
pub fn first_emphasis(markup: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)>").ok()?;
    let caps = re.captures(markup)?;
    let text = strip_tags(caps.get(1)?.as_str());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Remove figure/image/vector/canvas elements.
pub fn strip_visuals(markup: &str) -> String {
    let mut out = markup.to_string();
    for pattern in [
        r"(?is)<figure\b[^>]*>.*?</figure>",
        r"(?is)<svg\b[^>]*>.*?</svg>",
        r"(?is)<canvas\b[^>]*>.*?</canvas>",
        r"(?is)<img\b[^>]*/?>",
    ] {
        if let Ok(re) = Regex::new(pattern) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out
}

/// Remove collapsible-detail blocks, side notes and embedded comments.
pub fn strip_details(markup: &str) -> String {
    let mut out = markup.to_string();
    for pattern in [
        r"(?is)<details\b[^>]*>.*?</details>",
        r"(?is)<aside\b[^>]*>.*?</aside>",
        r"(?s)<!--.*?-->",
    ] {
        if let Ok(re) = Regex::new(pattern) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out
}

/// Split plain text into sentences. Terminal punctuation stays attached;
/// a trailing fragment without punctuation counts as a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let re = match Regex::new(r#"[^.!?]+[.!?]+["')\]]*|[^.!?]+$"#) {
        Ok(re) => re,
        Err(_) => return vec![text.trim().to_string()],
    };

    re.find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keep at most `max` words, appending an ellipsis when truncated.
pub fn truncate_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max {
        return words.join(" ");
    }
    format!("{}...", words[..max].join(" "))
}

/// Collect block-level elements (headings, list items, paragraphs) in
/// document order. Paragraphs containing emphasis markup are classified
/// separately so condensation can prefer them.
pub fn collect_elements(markup: &str) -> Vec<Element> {
    let re = match Regex::new(
        r"(?is)(?P<h><h[1-6][^>]*>.*?</h[1-6]>)|(?P<li><li[^>]*>.*?</li>)|(?P<p><p[^>]*>.*?</p>)",
    ) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let emphasis_re = Regex::new(r"(?is)<(?:strong|b|em)\b").ok();

    let mut elements = Vec::new();
    for caps in re.captures_iter(markup) {
        let (kind, m) = if let Some(m) = caps.name("h") {
            (ElementKind::Heading, m)
        } else if let Some(m) = caps.name("li") {
            (ElementKind::ListItem, m)
        } else if let Some(m) = caps.name("p") {
            let kind = match &emphasis_re {
                Some(re) if re.is_match(m.as_str()) => ElementKind::Emphasis,
                _ => ElementKind::Paragraph,
            };
            (kind, m)
        } else {
            continue;
        };

        let text = strip_tags(m.as_str());
        if text.is_empty() {
            continue;
        }
        let words = word_count(&text);
        elements.push(Element {
            kind,
            raw: m.as_str().to_string(),
            text,
            words,
            pos: m.start(),
        });
    }
    elements
}
