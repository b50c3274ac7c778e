use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::text::{non_empty, parse_timestamp};
use super::{get_json, FeedAdapter, FetchError};
use crate::models::FeedItem;

const SOURCE_NAME: &str = "Dev.to";
const PER_PAGE: &str = "20";

#[derive(Debug, Deserialize)]
struct Article {
    id: u64,
    title: Option<String>,
    description: Option<String>,
    url: String,
    published_at: Option<String>,
    tag_list: Option<Vec<String>>,
    cover_image: Option<String>,
}

pub struct DevTo {
    client: Client,
    base_url: String,
}

impl DevTo {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn map_article(article: Article) -> Option<FeedItem> {
        let Some(title) = non_empty(article.title) else {
            debug!("Skipping Dev.to article {} without a title", article.id);
            return None;
        };

        Some(FeedItem {
            id: format!("devto-{}", article.id),
            title,
            description: article.description.unwrap_or_default(),
            source: SOURCE_NAME.to_string(),
            url: article.url,
            timestamp: article
                .published_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            keywords: article.tag_list.unwrap_or_default(),
            image_url: non_empty(article.cover_image),
        })
    }
}

#[async_trait]
impl FeedAdapter for DevTo {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn try_fetch(&self, keyword_bias: &[String]) -> Result<Vec<FeedItem>, FetchError> {
        let tags = keyword_bias.join(",");
        let request = self
            .client
            .get(format!("{}/api/articles", self.base_url))
            .query(&[("per_page", PER_PAGE), ("tag", tags.as_str())]);

        let articles: Vec<Article> = get_json(request).await?;
        Ok(articles.into_iter().filter_map(Self::map_article).collect())
    }
}
