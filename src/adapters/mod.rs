//! Upstream feed adapters.
//!
//! Every adapter maps one upstream payload shape onto [`FeedItem`]. The
//! public [`FeedAdapter::fetch`] never fails: errors are logged and turn
//! into an empty result so one broken source cannot sink a cycle.

mod devto;
mod github;
mod hacker_news;
mod rss;
pub mod text;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{Config, Endpoints, RssMode};
use crate::models::{FeedItem, Source, SourceKind};

pub use devto::DevTo;
pub use github::{build_search_query, GitHubTrending};
pub use hacker_news::HackerNews;
pub use rss::RssFeed;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("RSS bridge returned status '{0}'")]
    BridgeStatus(String),

    #[error("Failed to parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("Source has no feed url")]
    MissingUrl,
}

#[async_trait]
pub trait FeedAdapter: Send + Sync {
    /// Source name, used for logging
    fn name(&self) -> &str;

    async fn try_fetch(&self, keyword_bias: &[String]) -> Result<Vec<FeedItem>, FetchError>;

    /// Fetch and normalize items, degrading any failure to an empty list.
    async fn fetch(&self, keyword_bias: &[String]) -> Vec<FeedItem> {
        match self.try_fetch(keyword_bias).await {
            Ok(items) => {
                info!("Fetched {} items from '{}'", items.len(), self.name());
                items
            }
            Err(e) => {
                error!("Failed to fetch '{}': {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// Send a request and decode a JSON body, treating non-2xx as an error.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    Ok(response.json::<T>().await?)
}

/// Builds adapters for registry entries, sharing one HTTP client.
#[derive(Clone)]
pub struct AdapterFactory {
    client: Client,
    endpoints: Endpoints,
    trending_language: Option<String>,
    rss_bridge_api_key: Option<String>,
    rss_mode: RssMode,
}

impl AdapterFactory {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
            trending_language: config.trending_language.clone(),
            rss_bridge_api_key: config.rss_bridge_api_key.clone(),
            rss_mode: config.rss_mode,
        })
    }

    pub fn for_source(&self, source: &Source) -> Arc<dyn FeedAdapter> {
        match source.kind {
            SourceKind::GitHub => Arc::new(GitHubTrending::new(
                self.client.clone(),
                &self.endpoints.github,
                self.trending_language.clone(),
            )),
            SourceKind::HackerNews => Arc::new(HackerNews::new(
                self.client.clone(),
                &self.endpoints.hacker_news,
            )),
            SourceKind::DevTo => Arc::new(DevTo::new(self.client.clone(), &self.endpoints.devto)),
            SourceKind::Rss => {
                let feed = RssFeed::new(self.client.clone(), &source.name, &source.url);
                let feed = match self.rss_mode {
                    RssMode::Bridge => feed.via_bridge(
                        &self.endpoints.rss_bridge,
                        self.rss_bridge_api_key.clone(),
                    ),
                    RssMode::Direct => feed,
                };
                Arc::new(feed)
            }
        }
    }

    /// One adapter per enabled source, in registry order.
    pub fn for_sources(&self, sources: &[Source]) -> Vec<Arc<dyn FeedAdapter>> {
        sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| self.for_source(s))
            .collect()
    }
}
