//! Plain-text body cleanup
//!
//! Email bodies arrive with CRLF line endings, tab indentation, invisible
//! formatting characters and tracking parameters on links. This module
//! reduces them to readable paragraphs.

use regex::Regex;
use std::sync::LazyLock;

/// Zero-width space, non-joiner, joiner, BOM and soft hyphen
const INVISIBLE_CHARS: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{00AD}'];

static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// `?utm_...` / `&utm_...` up to whitespace, `)` or end of text
static UTM_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]utm_[^)\s]*").expect("valid regex"));

/// A URL that is the only content of a parenthesized group
static PARENTHESIZED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*(https?://[^\s)]+)\s*\)").expect("valid regex"));

/// Clean up a plain-text body
///
/// Repeats the cleanup pass until the text stops changing, so
/// `sanitize_text(&sanitize_text(x)) == sanitize_text(x)`.
pub fn sanitize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut current = sanitize_pass(text);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_pass(text: &str) -> String {
    let text = text.replace('\r', "").replace('\t', " ");
    let text: String = text.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    let text = MULTI_SPACE.replace_all(&text, " ");

    let text = normalize_lines(&text);

    let text = UTM_PARAM.replace_all(&text, "");
    let text = PARENTHESIZED_URL.replace_all(&text, " $1");
    let text = MULTI_SPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Trim every line and drop empty ones; a run of empty lines becomes a
/// single blank line between paragraphs
fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut paragraph_break = false;

    for line in text.split('\n').map(str::trim) {
        if line.is_empty() {
            paragraph_break = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if paragraph_break { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        paragraph_break = false;
    }

    out
}
