//! Cleanup for rich-text HTML coming out of the landing page editor.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static START_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[a-zA-Z][^>]*>").unwrap());
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});
static JAVASCRIPT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(\s(?:href|src)\s*=\s*)(?:"\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*)"#,
    )
    .unwrap()
});
static EMPTY_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p\b[^>]*>(?:\s|&nbsp;|<br\s*/?>)*</p\s*>").unwrap());
static MULTILINE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s*\n\s*<").unwrap());
static INLINE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r">[ \t]{2,}<").unwrap());

/// Normalizes editor HTML. Returns `None` when nothing meaningful is left.
pub fn normalize_html(input: &str) -> Option<String> {
    let html = input.replace("\r\n", "\n").replace('\r', "\n");
    let html = SCRIPT_BLOCK.replace_all(&html, "");
    let html = STYLE_BLOCK.replace_all(&html, "");
    let html = START_TAG.replace_all(&html, |caps: &Captures| clean_start_tag(&caps[0]));
    let html = EMPTY_PARAGRAPH.replace_all(&html, "");
    let html = MULTILINE_GAP.replace_all(&html, "><");
    let html = INLINE_GAP.replace_all(&html, "> <");

    let trimmed = html.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Strips event handlers and `javascript:` URLs from a single start tag.
fn clean_start_tag(tag: &str) -> String {
    let tag = EVENT_HANDLER.replace_all(tag, "");
    JAVASCRIPT_URL
        .replace_all(&tag, r##"${1}"#""##)
        .into_owned()
}
