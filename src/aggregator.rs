use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::{AdapterFactory, FeedAdapter};
use crate::keywords::KeywordRegistry;
use crate::models::{FeedItem, Source};
use crate::sources::SourceRegistry;
use crate::views::{self, DateGroup, FeedFilter};

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load feeds, please try again later";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    pub items: Vec<FeedItem>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub phase: Phase,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl AggregationState {
    pub fn filtered(&self, filter: &FeedFilter) -> Vec<&FeedItem> {
        views::filter_items(&self.items, filter)
    }

    pub fn grouped_by_date<Tz: TimeZone>(
        &self,
        filter: &FeedFilter,
        now: &DateTime<Tz>,
    ) -> Vec<DateGroup<'_>> {
        views::group_by_date(&self.filtered(filter), now)
    }

    pub fn available_sources(&self) -> Vec<String> {
        views::available_sources(&self.items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    Panicked(String),
    Cancelled,
}

/// Outcome of one task run through [`settle_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(TaskFailure),
}

/// Run every task concurrently and wait for all of them, whatever their
/// outcome. Results are returned in input order.
pub async fn settle_all<T, F>(tasks: impl IntoIterator<Item = F>) -> Vec<Settled<T>>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    settle_handles(tasks.into_iter().map(tokio::spawn).collect()).await
}

/// Wait on tasks that were already spawned. Results are returned in input
/// order.
pub async fn settle_handles<T>(handles: Vec<JoinHandle<T>>) -> Vec<Settled<T>> {
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(value) => Settled::Fulfilled(value),
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "task panicked".to_string());
                Settled::Rejected(TaskFailure::Panicked(message))
            }
            Err(_) => Settled::Rejected(TaskFailure::Cancelled),
        })
        .collect()
}

/// Merge per-source results and order them newest first. The sort is
/// stable, so equal timestamps keep source order.
pub fn merge_sorted(batches: Vec<Vec<FeedItem>>) -> Vec<FeedItem> {
    let mut merged: Vec<FeedItem> = batches.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

/// Fan out over every adapter and merge what comes back.
async fn collect_cycle(
    adapters: Vec<Arc<dyn FeedAdapter>>,
    keyword_bias: &[String],
) -> anyhow::Result<Vec<FeedItem>> {
    let names: Vec<String> = adapters.iter().map(|a| a.name().to_string()).collect();
    let tasks = adapters.into_iter().map(|adapter| {
        let bias = keyword_bias.to_vec();
        async move { adapter.fetch(&bias).await }
    });

    merge_outcomes(&names, settle_all(tasks).await)
}

/// Panicking adapters are skipped; a task cancelled by the runtime aborts
/// the cycle.
fn merge_outcomes(
    names: &[String],
    outcomes: Vec<Settled<Vec<FeedItem>>>,
) -> anyhow::Result<Vec<FeedItem>> {
    let mut batches = Vec::with_capacity(names.len());
    for (name, outcome) in names.iter().zip(outcomes) {
        match outcome {
            Settled::Fulfilled(items) => batches.push(items),
            Settled::Rejected(TaskFailure::Panicked(message)) => {
                warn!("Fetch task for '{}' panicked: {}", name, message);
            }
            Settled::Rejected(TaskFailure::Cancelled) => {
                anyhow::bail!("fetch task for '{}' was cancelled", name);
            }
        }
    }

    Ok(merge_sorted(batches))
}

pub struct Aggregator {
    factory: AdapterFactory,
    state: Arc<RwLock<AggregationState>>,
}

impl Aggregator {
    pub fn new(factory: AdapterFactory) -> Self {
        Self {
            factory,
            state: Arc::new(RwLock::new(AggregationState::default())),
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> AggregationState {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<FeedItem> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Full re-fetch across the enabled sources.
    pub async fn refresh(&self, sources: &[Source], keyword_bias: &[String]) {
        let adapters = self.factory.for_sources(sources);
        self.refresh_with(adapters, keyword_bias).await;
    }

    pub async fn refresh_with(&self, adapters: Vec<Arc<dyn FeedAdapter>>, keyword_bias: &[String]) {
        info!("Refreshing {} sources", adapters.len());
        self.begin().await;
        let result = collect_cycle(adapters, keyword_bias).await;
        self.finish(result).await;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.last_error = None;
        state.phase = Phase::Loading;
    }

    pub(crate) async fn finish(&self, result: anyhow::Result<Vec<FeedItem>>) {
        let mut state = self.state.write().await;
        match result {
            Ok(items) => {
                info!("Feed refresh complete: {} items", items.len());
                state.items = items;
                state.phase = Phase::Success;
                state.last_refreshed = Some(Utc::now());
            }
            Err(e) => {
                error!("Feed refresh failed: {:#}", e);
                state.last_error = Some(LOAD_ERROR_MESSAGE.to_string());
                state.phase = Phase::Error;
            }
        }
        state.loading = false;
    }
}

/// Log the grouped view of the current items.
pub fn log_digest(state: &AggregationState) {
    let groups = state.grouped_by_date(&FeedFilter::default(), &Local::now());
    for group in &groups {
        info!("{}: {} items", group.label, group.items.len());
        for item in &group.items {
            info!(
                "  {} [{}] {}",
                views::format_time(&item.timestamp, &Local),
                item.source,
                item.title
            );
        }
    }
}

/// Time between cycles. Saturates instead of overflowing.
fn refresh_period(interval_minutes: u64) -> Duration {
    Duration::from_secs(interval_minutes.saturating_mul(60))
}

pub async fn start_background_refresh(
    aggregator: Arc<Aggregator>,
    sources: Arc<RwLock<SourceRegistry>>,
    keywords: Arc<RwLock<KeywordRegistry>>,
    interval_minutes: u64,
) {
    let interval = refresh_period(interval_minutes);

    info!("Starting initial feed fetch");
    run_cycle(&aggregator, &sources, &keywords).await;

    loop {
        tokio::time::sleep(interval).await;
        info!("Starting scheduled feed refresh");
        run_cycle(&aggregator, &sources, &keywords).await;
    }
}

pub async fn run_cycle(
    aggregator: &Aggregator,
    sources: &RwLock<SourceRegistry>,
    keywords: &RwLock<KeywordRegistry>,
) {
    let enabled = sources.read().await.enabled_sources();
    let bias = keywords.read().await.bias();

    aggregator.refresh(&enabled, &bias).await;
    log_digest(&aggregator.state().await);
}
