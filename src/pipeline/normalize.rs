//! Full-text XML → plain prose.
//!
//! PMC full-text records are JATS XML: front matter, the article body, and
//! back matter (references, acknowledgements). Only the body is worth
//! sending to the model, so extraction is restricted to the first `<body>`
//! element when one exists.
//!
//! This is a deliberately forgiving text pass rather than an XML parse.
//! Truncated or malformed markup degrades the output but never fails; the
//! caller decides whether what is left is long enough to use.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

// An unterminated tag at end of input is stripped too.
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+(?:>|$)").unwrap());

static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(amp|lt|gt|quot|#39);").unwrap());

/// Extract readable text from a full-text markup document.
///
/// 1. Restrict to the first `<body>` region if present
/// 2. Replace every tag with a single space
/// 3. Decode the five standard entities in one pass
/// 4. Collapse whitespace runs and trim
pub fn extract_text_from_xml(xml: &str) -> String {
    let section = body_region(xml);
    let untagged = strip_tags(section);
    let decoded = decode_entities(&untagged);
    collapse_whitespace(&decoded)
}

fn body_region(xml: &str) -> &str {
    RE_BODY
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(xml)
}

fn strip_tags(input: &str) -> String {
    RE_TAG.replace_all(input, " ").into_owned()
}

/// Single pass: `&amp;lt;` becomes `&lt;` and stays that way.
fn decode_entities(input: &str) -> String {
    RE_ENTITY
        .replace_all(input, |caps: &Captures| match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            _ => "'",
        })
        .into_owned()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
