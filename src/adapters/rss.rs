use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::text::{extract_keywords, non_empty, parse_timestamp, strip_html};
use super::{get_json, FeedAdapter, FetchError};
use crate::models::FeedItem;

const ITEM_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    status: String,
    #[serde(default)]
    items: Vec<BridgeItem>,
}

#[derive(Debug, Deserialize)]
struct BridgeItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    content: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    thumbnail: Option<String>,
}

/// Fields shared by bridge items and locally parsed entries.
#[derive(Debug, Default)]
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    content: Option<String>,
    published: Option<DateTime<Utc>>,
    thumbnail: Option<String>,
}

impl From<BridgeItem> for RawEntry {
    fn from(item: BridgeItem) -> Self {
        Self {
            published: item.pub_date.as_deref().and_then(parse_timestamp),
            title: item.title,
            link: item.link,
            description: item.description,
            content: item.content,
            thumbnail: item.thumbnail,
        }
    }
}

impl From<feed_rs::model::Entry> for RawEntry {
    fn from(entry: feed_rs::model::Entry) -> Self {
        let thumbnail = entry
            .media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.clone())
            .next();

        Self {
            title: entry.title.map(|t| t.content),
            link: entry.links.first().map(|l| l.href.clone()),
            description: entry.summary.map(|s| s.content),
            content: entry.content.and_then(|c| c.body),
            published: entry.published.or(entry.updated),
            thumbnail,
        }
    }
}

struct Bridge {
    base_url: String,
    api_key: Option<String>,
}

/// A user-supplied RSS feed, converted either through the RSS-to-JSON
/// bridge or parsed locally.
pub struct RssFeed {
    client: Client,
    source_name: String,
    feed_url: String,
    bridge: Option<Bridge>,
}

impl RssFeed {
    /// Parses the feed locally unless [`RssFeed::via_bridge`] is applied.
    pub fn new(client: Client, source_name: &str, feed_url: &str) -> Self {
        Self {
            client,
            source_name: source_name.to_string(),
            feed_url: feed_url.trim().to_string(),
            bridge: None,
        }
    }

    pub fn via_bridge(mut self, base_url: &str, api_key: Option<String>) -> Self {
        self.bridge = Some(Bridge {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: non_empty(api_key),
        });
        self
    }

    async fn fetch_bridge(&self, bridge: &Bridge) -> Result<Vec<RawEntry>, FetchError> {
        let count = ITEM_COUNT.to_string();
        let mut params = vec![("rss_url", self.feed_url.as_str())];
        if let Some(key) = &bridge.api_key {
            params.push(("api_key", key.as_str()));
        }
        params.push(("count", count.as_str()));

        let request = self
            .client
            .get(format!("{}/v1/api.json", bridge.base_url))
            .query(&params);
        let response: BridgeResponse = get_json(request).await?;

        if response.status != "ok" {
            return Err(FetchError::BridgeStatus(response.status));
        }
        Ok(response.items.into_iter().map(RawEntry::from).collect())
    }

    async fn fetch_direct(&self) -> Result<Vec<RawEntry>, FetchError> {
        let response = self.client.get(&self.feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        let parsed = parser::parse(&bytes[..])?;

        Ok(parsed
            .entries
            .into_iter()
            .take(ITEM_COUNT)
            .map(RawEntry::from)
            .collect())
    }

    fn map_entry(&self, index: usize, entry: RawEntry) -> Option<FeedItem> {
        let Some(title) = non_empty(entry.title) else {
            warn!("Skipping entry {} of '{}' with no title", index, self.source_name);
            return None;
        };

        let raw_description = entry.description.unwrap_or_default();
        let keywords = extract_keywords(&format!("{} {}", title, raw_description));
        let body = if raw_description.is_empty() {
            entry.content.unwrap_or_default()
        } else {
            raw_description
        };

        Some(FeedItem {
            id: format!("rss-{}-{}", self.source_name, index),
            title,
            description: strip_html(&body),
            source: self.source_name.clone(),
            url: entry.link.unwrap_or_default(),
            timestamp: entry.published.unwrap_or_else(Utc::now),
            keywords,
            image_url: non_empty(entry.thumbnail),
        })
    }
}

#[async_trait]
impl FeedAdapter for RssFeed {
    fn name(&self) -> &str {
        &self.source_name
    }

    async fn try_fetch(&self, _keyword_bias: &[String]) -> Result<Vec<FeedItem>, FetchError> {
        if self.feed_url.is_empty() {
            return Err(FetchError::MissingUrl);
        }

        info!("Fetching feed: {} ({})", self.source_name, self.feed_url);
        let entries = match &self.bridge {
            Some(bridge) => self.fetch_bridge(bridge).await?,
            None => self.fetch_direct().await?,
        };

        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| self.map_entry(index, entry))
            .collect())
    }
}
