use crate::database::Database;
use crate::mastodon::MastodonClient;
use crate::pipeline::FeedProcessor;
use crate::sources::RssFeedSource;
use crate::types::{CycleReport, FeedConfig, FeedSource, FetchConfig, Result, RunOptions};
use crate::{EntryStore, FeedManager};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Which feeds a run covers.
#[derive(Debug, Clone)]
pub enum FeedSelection {
    /// Every feed in the catalog, re-read at the start of each cycle.
    Catalog,
    /// One feed that is not stored in the catalog.
    Single(FeedConfig),
}

/// Drives feed cycles over the configured feeds, once or on a timer.
pub struct FeedPoster {
    feed_manager: FeedManager,
    store: EntryStore,
    source: Box<dyn FeedSource>,
    fetch_config: FetchConfig,
}

impl FeedPoster {
    pub fn new(db: &Database, fetch_config: FetchConfig) -> Result<Self> {
        let source = RssFeedSource::new(fetch_config.clone())?;

        Ok(Self {
            feed_manager: FeedManager::new(db.pool().clone()),
            store: EntryStore::new(db.pool().clone()),
            source: Box::new(source),
            fetch_config,
        })
    }

    pub fn with_source(mut self, source: Box<dyn FeedSource>) -> Self {
        self.source = source;
        self
    }

    pub fn feed_manager(&self) -> &FeedManager {
        &self.feed_manager
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// One pass over `feeds`. A feed that fails is logged and skipped; only a
    /// store failure is returned.
    pub async fn run_once(&self, feeds: &FeedSelection, options: RunOptions) -> Result<Vec<CycleReport>> {
        let feeds = match feeds {
            FeedSelection::Catalog => self.feed_manager.list_feeds().await?,
            FeedSelection::Single(feed) => vec![feed.clone()],
        };

        if feeds.is_empty() {
            info!("No feeds configured");
        }

        let mut reports = Vec::with_capacity(feeds.len());
        for feed in &feeds {
            if let Some(report) = self.run_feed(feed, options).await? {
                reports.push(report);
            }
        }

        info!("Processed {}/{} feeds", reports.len(), feeds.len());
        Ok(reports)
    }

    /// `Ok(None)` when the feed's cycle was abandoned.
    pub async fn run_feed(&self, feed: &FeedConfig, options: RunOptions) -> Result<Option<CycleReport>> {
        info!(
            "Running feed: {}, URL: {}, Instance: {}, Max Age: {} days, Toot Format: {:?}",
            feed.id, feed.feed_url, feed.instance_url, feed.max_post_age_days, feed.post_format
        );

        let outcome = match MastodonClient::new(&feed.instance_url, &feed.access_token, &self.fetch_config) {
            Ok(publisher) => {
                FeedProcessor::new(self.source.as_ref(), &self.store, options)
                    .process(feed, &publisher)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => Ok(Some(report)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!("Feed {} ({}) skipped: {}", feed.id, feed.feed_url, e);
                Ok(None)
            }
        }
    }

    /// Repeat [`run_once`](Self::run_once) every `period` until Ctrl-C. A
    /// cycle in progress is finished before the loop stops.
    pub async fn run_forever(&self, feeds: &FeedSelection, period: Duration, options: RunOptions) -> Result<()> {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!("Polling every {}s", period.as_secs());

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.run_once(feeds, options).await?;
                }
            }
        }
    }
}
