use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::models::{RawSource, Source, SourceKind};
use crate::store::{KvStore, StoreError};

pub const SOURCES_KEY: &str = "assistant-sources";

pub fn builtin_sources() -> Vec<Source> {
    let builtin = |id: &str, name: &str, kind| Source {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        url: String::new(),
        enabled: true,
        removable: false,
    };

    vec![
        builtin("github", "GitHub", SourceKind::GitHub),
        builtin("hacker-news", "Hacker News", SourceKind::HackerNews),
        builtin("devto", "Dev.to", SourceKind::DevTo),
    ]
}

/// Canonicalize persisted entries: drop entries without an id or name,
/// fill defaults, and append any built-in whose id is missing.
pub fn normalize(raw: Vec<RawSource>) -> Vec<Source> {
    let mut normalized: Vec<Source> = raw
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id.filter(|id| !id.is_empty())?;
            let name = entry.name.filter(|name| !name.is_empty())?;
            Some(Source {
                id,
                name,
                kind: SourceKind::parse(entry.kind.as_deref()),
                url: entry.url.unwrap_or_default(),
                enabled: entry.enabled.unwrap_or(true),
                removable: entry.removable.unwrap_or(true),
            })
        })
        .collect();

    for builtin in builtin_sources() {
        if !normalized.iter().any(|s| s.id == builtin.id) {
            normalized.push(builtin);
        }
    }

    normalized
}

/// Millisecond id with `prefix`, bumped until it does not collide.
pub(crate) fn next_time_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = format!("{}{}", prefix, millis);
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

pub struct SourceRegistry {
    store: Arc<KvStore>,
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub async fn load(store: Arc<KvStore>) -> Result<Self, StoreError> {
        let defaults: Vec<RawSource> = builtin_sources().into_iter().map(RawSource::from).collect();
        let raw = store.get(SOURCES_KEY, defaults).await;

        let sources = normalize(raw);
        store.set(SOURCES_KEY, &sources).await?;
        let registry = Self { store, sources };
        debug!("Loaded {} sources", registry.sources.len());
        Ok(registry)
    }

    /// Persist `next` and adopt it only once the write succeeded.
    async fn commit(&mut self, next: Vec<Source>) -> Result<(), StoreError> {
        self.store.set(SOURCES_KEY, &next).await?;
        self.sources = next;
        Ok(())
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn enabled_sources(&self) -> Vec<Source> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Add a custom RSS source. Returns `None` when either input is blank.
    pub async fn add(&mut self, name: &str, url: &str) -> Result<Option<Source>, StoreError> {
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() || url.is_empty() {
            return Ok(None);
        }

        let id = next_time_id("rss-", |candidate| self.get(candidate).is_some());
        let source = Source {
            id,
            name: name.to_string(),
            kind: SourceKind::Rss,
            url: url.to_string(),
            enabled: true,
            removable: true,
        };

        let mut next = self.sources.clone();
        next.push(source.clone());
        self.commit(next).await?;
        info!("Added source '{}' ({})", source.name, source.url);
        Ok(Some(source))
    }

    /// Remove a removable source. Returns whether anything was removed.
    pub async fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(index) = self.sources.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        if !self.sources[index].removable {
            return Ok(false);
        }

        let mut next = self.sources.clone();
        let removed = next.remove(index);
        self.commit(next).await?;
        info!("Removed source '{}'", removed.name);
        Ok(true)
    }

    pub async fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut next = self.sources.clone();
        let Some(source) = next.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        source.enabled = !source.enabled;
        self.commit(next).await?;
        Ok(true)
    }

    pub fn name_exists(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.sources.iter().any(|s| s.name.to_lowercase() == name)
    }

    pub fn url_exists(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.sources
            .iter()
            .any(|s| !s.url.is_empty() && s.url.to_lowercase() == url)
    }

    /// Seed RSS feeds from the config file, skipping any whose name or url
    /// is already registered. Returns the number of sources added.
    pub async fn sync_configured(&mut self, feeds: &[FeedConfig]) -> Result<usize, StoreError> {
        let mut added = 0;
        for feed in feeds {
            if self.name_exists(feed.name.trim()) || self.url_exists(feed.url.trim()) {
                continue;
            }
            if self.add(&feed.name, &feed.url).await?.is_some() {
                added += 1;
            }
        }
        Ok(added)
    }
}
