//! Best-effort HTML helpers: `<title>` extraction and plain-text conversion.
//!
//! These are regex based and make no attempt to parse HTML properly. On
//! well-formed email markup they give sensible output; on malformed markup
//! the result is whatever the patterns happen to match.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // `.` does not cross newlines, so a title must sit on one line.
    static ref TITLE: Regex = Regex::new(r"(?i)<title>(.+)</title>").unwrap();

    static ref INVISIBLE_BLOCKS: [Regex; 3] = [
        Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").unwrap(),
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap(),
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap(),
    ];
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"(?i)<li\b[^>]*>").unwrap();
    static ref BLOCK_BOUNDARY: Regex = Regex::new(
        r"(?i)</?(p|div|h[1-6]|ul|ol|li|table|tr|blockquote|pre|hr|section|article|header|footer)\b[^>]*>"
    )
    .unwrap();
    static ref LINK: Regex =
        Regex::new(r#"(?is)<a\b[^>]*\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#).unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\u{a0}]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// The trimmed text of the first single-line `<title>` element, if any.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Remove every single-line `<title>` element.
pub fn strip_title(html: &str) -> String {
    TITLE.replace_all(html, "").into_owned()
}

/// Convert an HTML body to readable plain text.
///
/// Drops `<head>`, `<style>` and `<script>` blocks, keeps line breaks at block
/// boundaries, renders links as `text [href]` and decodes common entities.
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();
    for block in INVISIBLE_BLOCKS.iter() {
        text = block.replace_all(&text, "").into_owned();
    }
    let text = COMMENT.replace_all(&text, "");
    // Source newlines carry no meaning in HTML
    let text = text.replace(|c: char| c == '\n' || c == '\r', " ");
    let text = LINK.replace_all(&text, |caps: &regex::Captures| {
        let label = TAG.replace_all(&caps[2], "").trim().to_string();
        let href = caps[1].trim();
        if href.is_empty() || label == href || href.starts_with('#') {
            label
        } else if label.is_empty() {
            href.to_string()
        } else {
            format!("{} [{}]", label, href)
        }
    });
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "\n- ");
    let text = BLOCK_BOUNDARY.replace_all(&text, "\n\n");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .collect();
    let text = lines.join("\n");

    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&copy;", "\u{a9}")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        // last, so "&amp;lt;" becomes "&lt;" and not "<"
        .replace("&amp;", "&")
}
