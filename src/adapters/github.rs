use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::text::{non_empty, parse_timestamp};
use super::{get_json, FeedAdapter, FetchError};
use crate::models::FeedItem;

const SOURCE_NAME: &str = "GitHub";
const PER_PAGE: &str = "20";
const LOOKBACK_DAYS: i64 = 7;
const MAX_TOPICS: usize = 3;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    id: u64,
    full_name: String,
    description: Option<String>,
    html_url: String,
    created_at: Option<String>,
    language: Option<String>,
    topics: Option<Vec<String>>,
}

/// Repositories created in the last week, ranked by stars.
pub struct GitHubTrending {
    client: Client,
    base_url: String,
    language: Option<String>,
}

impl GitHubTrending {
    pub fn new(client: Client, base_url: &str, language: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: non_empty(language),
        }
    }

    fn map_repository(repo: Repository) -> FeedItem {
        let mut keywords = Vec::new();
        if let Some(language) = non_empty(repo.language) {
            keywords.push(language);
        }
        keywords.extend(repo.topics.unwrap_or_default().into_iter().take(MAX_TOPICS));

        FeedItem {
            id: format!("github-{}", repo.id),
            title: repo.full_name,
            description: non_empty(repo.description).unwrap_or_else(|| "No description".to_string()),
            source: SOURCE_NAME.to_string(),
            url: repo.html_url,
            timestamp: repo
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            keywords,
            image_url: None,
        }
    }
}

/// `created:>SINCE [language:L] [kw1 OR kw2 ...]`
pub fn build_search_query(since: NaiveDate, language: Option<&str>, keyword_bias: &[String]) -> String {
    let mut query = format!("created:>{}", since.format("%Y-%m-%d"));
    if let Some(language) = language {
        query.push_str(&format!(" language:{}", language));
    }
    if !keyword_bias.is_empty() {
        query.push(' ');
        query.push_str(&keyword_bias.join(" OR "));
    }
    query
}

#[async_trait]
impl FeedAdapter for GitHubTrending {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn try_fetch(&self, keyword_bias: &[String]) -> Result<Vec<FeedItem>, FetchError> {
        let since = (Utc::now() - Duration::days(LOOKBACK_DAYS)).date_naive();
        let query = build_search_query(since, self.language.as_deref(), keyword_bias);

        let request = self
            .client
            .get(format!("{}/search/repositories", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", PER_PAGE),
            ])
            .header("Accept", "application/vnd.github.v3+json");

        let response: SearchResponse = get_json(request).await?;
        Ok(response
            .items
            .into_iter()
            .map(Self::map_repository)
            .collect())
    }
}
