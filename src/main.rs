use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedhub::adapters::AdapterFactory;
use feedhub::aggregator::{run_cycle, start_background_refresh, Aggregator};
use feedhub::config::Config;
use feedhub::keywords::KeywordRegistry;
use feedhub::sources::SourceRegistry;
use feedhub::store::KvStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedhub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("FEEDHUB_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    // Initialize storage
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
    let store = KvStore::new(&database_url).await?;
    store.initialize().await?;
    let store = Arc::new(store);
    info!("Store initialized");

    let mut sources = SourceRegistry::load(store.clone()).await?;
    let added = sources.sync_configured(&config.feeds).await?;
    info!("{} sources registered ({} new from config)", sources.sources().len(), added);
    let keywords = KeywordRegistry::load(store.clone()).await;

    let sources = Arc::new(RwLock::new(sources));
    let keywords = Arc::new(RwLock::new(keywords));
    let aggregator = Arc::new(Aggregator::new(AdapterFactory::new(&config)?));

    if config.refresh_interval == 0 {
        run_cycle(&aggregator, &sources, &keywords).await;
        return Ok(());
    }

    start_background_refresh(aggregator, sources, keywords, config.refresh_interval).await;
    Ok(())
}
