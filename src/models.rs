use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One content entry from any source, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "hackerNews")]
    HackerNews,
    #[serde(rename = "devto")]
    DevTo,
    #[serde(rename = "rss")]
    Rss,
}

impl SourceKind {
    /// Unknown or missing kinds are treated as RSS feeds.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("github") => SourceKind::GitHub,
            Some("hackerNews") => SourceKind::HackerNews,
            Some("devto") => SourceKind::DevTo,
            _ => SourceKind::Rss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub url: String,
    pub enabled: bool,
    pub removable: bool,
}

/// A persisted source entry before normalization. Every field is optional
/// so that hand-edited or older blobs still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub removable: Option<bool>,
}

impl From<Source> for RawSource {
    fn from(source: Source) -> Self {
        let kind = serde_json::to_value(source.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string));
        Self {
            id: Some(source.id),
            name: Some(source.name),
            kind,
            url: Some(source.url),
            enabled: Some(source.enabled),
            removable: Some(source.removable),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: String,
    pub name: String,
    pub color: String,
    pub enabled: bool,
}

/// Partial keyword update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeywordUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_item_serializes_camel_case() {
        let item = FeedItem {
            id: "hn-1".to_string(),
            title: "Title".to_string(),
            description: String::new(),
            source: "Hacker News".to_string(),
            url: "https://example.com".to_string(),
            timestamp: "2024-01-02T10:00:00Z".parse().unwrap(),
            keywords: vec![],
            image_url: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["imageUrl"], serde_json::Value::Null);
        assert_eq!(json["timestamp"], "2024-01-02T10:00:00Z");
    }

    #[test]
    fn test_source_kind_round_trips_through_persisted_names() {
        let source = Source {
            id: "hacker-news".to_string(),
            name: "Hacker News".to_string(),
            kind: SourceKind::HackerNews,
            url: String::new(),
            enabled: true,
            removable: false,
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "hackerNews");

        let raw = RawSource::from(source);
        assert_eq!(raw.kind.as_deref(), Some("hackerNews"));
        assert_eq!(SourceKind::parse(raw.kind.as_deref()), SourceKind::HackerNews);
    }

    #[test]
    fn test_unknown_kind_parses_as_rss() {
        assert_eq!(SourceKind::parse(Some("mastodon")), SourceKind::Rss);
        assert_eq!(SourceKind::parse(None), SourceKind::Rss);
    }

    #[test]
    fn test_keyword_update_ignores_unknown_fields() {
        let update: KeywordUpdate =
            serde_json::from_str(r##"{"color":"#000000","id":"hijack","weight":3}"##).unwrap();
        assert_eq!(update.color.as_deref(), Some("#000000"));
        assert!(update.name.is_none());
        assert!(update.enabled.is_none());
    }
}
