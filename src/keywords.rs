use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{Keyword, KeywordUpdate};
use crate::sources::next_time_id;
use crate::store::{KvStore, StoreError};

pub const KEYWORDS_KEY: &str = "assistant-keywords";
pub const DEFAULT_COLOR: &str = "#667eea";

pub fn default_keywords() -> Vec<Keyword> {
    let keyword = |id: &str, name: &str, color: &str| Keyword {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        enabled: true,
    };

    vec![
        keyword("1", "Vue.js", "#42b883"),
        keyword("2", "AI", "#667eea"),
        keyword("3", "Web Development", "#f093fb"),
    ]
}

pub struct KeywordRegistry {
    store: Arc<KvStore>,
    keywords: Vec<Keyword>,
}

impl KeywordRegistry {
    pub async fn load(store: Arc<KvStore>) -> Self {
        let keywords = store.get(KEYWORDS_KEY, default_keywords()).await;
        debug!("Loaded {} keywords", keywords.len());
        Self { store, keywords }
    }

    /// Persist `next` and adopt it only once the write succeeded.
    async fn commit(&mut self, next: Vec<Keyword>) -> Result<(), StoreError> {
        self.store.set(KEYWORDS_KEY, &next).await?;
        self.keywords = next;
        Ok(())
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn enabled_keywords(&self) -> Vec<&Keyword> {
        self.keywords.iter().filter(|k| k.enabled).collect()
    }

    /// Names of the enabled keywords, passed to adapters as keyword bias.
    pub fn bias(&self) -> Vec<String> {
        self.enabled_keywords()
            .into_iter()
            .map(|k| k.name.clone())
            .collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords.iter().any(|k| k.name.to_lowercase() == name)
    }

    /// Returns `None` when the trimmed name is empty.
    pub async fn add(&mut self, name: &str, color: &str) -> Result<Option<Keyword>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let id = next_time_id("", |candidate| self.keywords.iter().any(|k| k.id == candidate));
        let keyword = Keyword {
            id,
            name: name.to_string(),
            color: color.to_string(),
            enabled: true,
        };

        let mut next = self.keywords.clone();
        next.push(keyword.clone());
        self.commit(next).await?;
        info!("Added keyword '{}'", keyword.name);
        Ok(Some(keyword))
    }

    pub async fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(index) = self.keywords.iter().position(|k| k.id == id) else {
            return Ok(false);
        };
        let mut next = self.keywords.clone();
        next.remove(index);
        self.commit(next).await?;
        Ok(true)
    }

    pub async fn update(&mut self, id: &str, update: KeywordUpdate) -> Result<bool, StoreError> {
        let mut next = self.keywords.clone();
        let Some(keyword) = next.iter_mut().find(|k| k.id == id) else {
            return Ok(false);
        };

        if let Some(name) = update.name {
            keyword.name = name;
        }
        if let Some(color) = update.color {
            keyword.color = color;
        }
        if let Some(enabled) = update.enabled {
            keyword.enabled = enabled;
        }

        self.commit(next).await?;
        Ok(true)
    }

    pub async fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut next = self.keywords.clone();
        let Some(keyword) = next.iter_mut().find(|k| k.id == id) else {
            return Ok(false);
        };
        keyword.enabled = !keyword.enabled;
        self.commit(next).await?;
        Ok(true)
    }
}
