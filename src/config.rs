use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Refresh interval in minutes, `0` runs a single cycle
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Restricts trending repositories to one language
    #[serde(default)]
    pub trending_language: Option<String>,
    #[serde(default)]
    pub rss_bridge_api_key: Option<String>,
    #[serde(default)]
    pub rss_mode: RssMode,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Custom RSS feeds seeded into the source registry
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

fn default_refresh_interval() -> u64 {
    15
}

fn default_database_url() -> String {
    "sqlite:feedhub.db?mode=rwc".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "FeedHub/1.0 (Feed Aggregator)".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RssMode {
    /// Convert feeds through the RSS-to-JSON bridge
    #[default]
    Bridge,
    /// Download and parse the feed XML locally
    Direct,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub github: String,
    pub hacker_news: String,
    pub devto: String,
    pub rss_bridge: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: "https://api.github.com".to_string(),
            hacker_news: "https://hacker-news.firebaseio.com".to_string(),
            devto: "https://dev.to".to_string(),
            rss_bridge: "https://api.rss2json.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            database_url: default_database_url(),
            trending_language: None,
            rss_bridge_api_key: None,
            rss_mode: RssMode::default(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            endpoints: Endpoints::default(),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
