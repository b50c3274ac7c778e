use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;

use super::text::{extract_keywords, non_empty, strip_html};
use super::{get_json, FeedAdapter, FetchError};
use crate::models::FeedItem;

const SOURCE_NAME: &str = "Hacker News";
const PAGE_SIZE: usize = 20;
const DISCUSSION_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct Story {
    id: u64,
    title: Option<String>,
    text: Option<String>,
    url: Option<String>,
    score: Option<i64>,
    time: Option<i64>,
}

/// Top stories from the Hacker News Firebase API.
pub struct HackerNews {
    client: Client,
    base_url: String,
}

impl HackerNews {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_story(&self, id: u64) -> Result<Option<Story>, FetchError> {
        get_json(self.client.get(format!("{}/v0/item/{}.json", self.base_url, id))).await
    }

    /// Stories without a title are skipped.
    fn map_story(story: Story) -> Option<FeedItem> {
        let title = non_empty(story.title)?;
        let description = match non_empty(story.text) {
            Some(text) => strip_html(&text),
            None => format!("{} points", story.score.unwrap_or(0)),
        };

        Some(FeedItem {
            id: format!("hn-{}", story.id),
            keywords: extract_keywords(&title),
            title,
            description,
            source: SOURCE_NAME.to_string(),
            url: non_empty(story.url).unwrap_or_else(|| format!("{}{}", DISCUSSION_URL, story.id)),
            timestamp: story
                .time
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .unwrap_or_else(Utc::now),
            image_url: None,
        })
    }
}

#[async_trait]
impl FeedAdapter for HackerNews {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    // Keyword bias has no equivalent in the top-stories API.
    async fn try_fetch(&self, _keyword_bias: &[String]) -> Result<Vec<FeedItem>, FetchError> {
        let ids: Vec<u64> =
            get_json(self.client.get(format!("{}/v0/topstories.json", self.base_url))).await?;

        // Any failed detail request fails the whole page.
        let stories =
            try_join_all(ids.into_iter().take(PAGE_SIZE).map(|id| self.fetch_story(id))).await?;

        Ok(stories
            .into_iter()
            .flatten()
            .filter_map(Self::map_story)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(value: serde_json::Value) -> Story {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_link_story() {
        let item = HackerNews::map_story(story(serde_json::json!({
            "id": 1001,
            "title": "Show HN: A Docker dashboard",
            "url": "https://example.com/dash",
            "score": 120,
            "time": 1710057600
        })))
        .unwrap();

        assert_eq!(item.id, "hn-1001");
        assert_eq!(item.description, "120 points");
        assert_eq!(item.url, "https://example.com/dash");
        assert_eq!(item.keywords, vec!["Docker"]);
        assert_eq!(item.timestamp.to_rfc3339(), "2024-03-10T08:00:00+00:00");
    }

    #[test]
    fn test_map_text_story_uses_discussion_url() {
        let item = HackerNews::map_story(story(serde_json::json!({
            "id": 1002,
            "title": "Ask HN: Favourite books?",
            "text": "<p>Looking for &quot;classics&quot;</p>",
            "time": 1710057600
        })))
        .unwrap();

        assert_eq!(item.description, "Looking for \"classics\"");
        assert_eq!(item.url, "https://news.ycombinator.com/item?id=1002");
    }

    #[test]
    fn test_missing_score_defaults_to_zero_points() {
        let item = HackerNews::map_story(story(serde_json::json!({
            "id": 1003,
            "title": "Untitled-ish"
        })))
        .unwrap();

        assert_eq!(item.description, "0 points");
    }

    #[test]
    fn test_story_without_title_is_dropped() {
        assert!(HackerNews::map_story(story(serde_json::json!({ "id": 1004 }))).is_none());
        assert!(HackerNews::map_story(story(serde_json::json!({ "id": 1005, "title": "" }))).is_none());
    }
}
