use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed vocabulary matched against free text. Matching is a plain
/// case-insensitive substring test, so "AI" also hits "maintain".
pub const KEYWORD_VOCABULARY: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "Python",
    "Vue.js",
    "React",
    "Node.js",
    "AI",
    "Machine Learning",
    "Web Development",
    "DevOps",
    "Docker",
    "Kubernetes",
    "AWS",
    "Cloud",
    "API",
    "Database",
    "Frontend",
    "Backend",
];

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[A-Za-z!][^>]*>").expect("valid tag regex"));

pub fn extract_keywords(text: &str) -> Vec<String> {
    let haystack = text.to_lowercase();
    KEYWORD_VOCABULARY
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Reduce an HTML fragment to its text content.
pub fn strip_html(html: &str) -> String {
    let without_tags = RE_TAGS.replace_all(html, "");
    html_escape::decode_html_entities(&without_tags)
        .trim()
        .to_string()
}

/// Parse the timestamp formats seen across upstream APIs: RFC 3339,
/// the bridge's `YYYY-MM-DD HH:MM:SS` (UTC) and RFC 2822.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Empty strings count as missing.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
