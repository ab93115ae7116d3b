use crate::formatter;
use crate::processing::{FilterStage, SkipReason};
use crate::state::EntryStore;
use crate::types::{CycleReport, FeedConfig, FeedSource, PosterError, Publisher, Result, RunOptions};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Runs one fetch → filter → publish cycle for a single feed/account pair.
///
/// Entries move through `fetched → filtered → rendered → published →
/// recorded`. Only a confirmed publish (or a dry run) reaches `recorded`;
/// everything else is looked at again next cycle.
pub struct FeedProcessor<'a> {
    source: &'a dyn FeedSource,
    store: &'a EntryStore,
    options: RunOptions,
}

impl<'a> FeedProcessor<'a> {
    pub fn new(source: &'a dyn FeedSource, store: &'a EntryStore, options: RunOptions) -> Self {
        Self {
            source,
            store,
            options,
        }
    }

    pub async fn process(&self, feed: &FeedConfig, publisher: &dyn Publisher) -> Result<CycleReport> {
        self.process_at(feed, publisher, Utc::now()).await
    }

    /// Auth and fetch failures end this feed's cycle. So does a bad post
    /// format, since every entry would fail the same way. Publish failures
    /// only skip the entry.
    pub async fn process_at(
        &self,
        feed: &FeedConfig,
        publisher: &dyn Publisher,
        now: DateTime<Utc>,
    ) -> Result<CycleReport> {
        let mut report = CycleReport {
            feed_id: feed.id,
            ..CycleReport::default()
        };

        let account = publisher
            .authenticate()
            .await
            .map_err(|e| PosterError::Auth {
                instance_url: feed.instance_url.clone(),
                reason: format!("{:#}", e),
            })?;
        info!("My user ID is {} (@{})", account.id, account.acct);

        info!("Checking RSS feed: {}", feed.feed_url);
        let entries = self
            .source
            .fetch(&feed.feed_url)
            .await
            .map_err(|e| PosterError::Fetch {
                url: feed.feed_url.clone(),
                reason: format!("{:#}", e),
            })?;

        report.fetched = entries.len();
        if entries.is_empty() {
            warn!("No entries in RSS feed {}", feed.feed_url);
            return Ok(report);
        }

        let mut posted = HashSet::new();
        for entry in &entries {
            if self.store.has_posted(&entry.id).await? {
                posted.insert(entry.id.clone());
            }
        }

        let selection = FilterStage::new(feed.max_post_age_days)
            .with_max_posts(self.options.max_posts)
            .select(entries, now, |id| posted.contains(id));

        for (entry, reason) in &selection.skipped {
            match reason {
                SkipReason::AlreadyPosted => info!(
                    "Already posted from {} (RSS ID {}). Skipping: {}",
                    entry.published_at, entry.id, entry.title
                ),
                SkipReason::TooOld => info!(
                    "Old post from {} (RSS ID {}). Skipping: {}",
                    entry.published_at, entry.id, entry.title
                ),
                SkipReason::CapReached => info!(
                    "Post limit of {} reached, deferring (RSS ID {}): {}",
                    self.options.max_posts, entry.id, entry.title
                ),
            }
        }
        report.already_posted = selection.count(SkipReason::AlreadyPosted);
        report.too_old = selection.count(SkipReason::TooOld);
        report.deferred = selection.count(SkipReason::CapReached);

        for entry in &selection.selected {
            let content = formatter::compose(entry, &feed.post_format)?;

            if self.options.dry_run {
                info!("Dry run, not posting: {}", entry.title);
            } else if let Err(e) = publish(publisher, &content).await {
                error!("Failed to post {} (RSS ID {}): {}", entry.title, entry.id, e);
                report.failed += 1;
                continue;
            }

            info!("Posted new article: {}", entry.title);
            info!("{}", content);
            self.store.mark_posted(&entry.id).await?;
            report.published += 1;
        }

        info!(
            "Feed {} done: {} fetched, {} published, {} failed, {} already posted, {} too old, {} deferred",
            feed.id,
            report.fetched,
            report.published,
            report.failed,
            report.already_posted,
            report.too_old,
            report.deferred
        );

        Ok(report)
    }
}

async fn publish(publisher: &dyn Publisher, content: &str) -> Result<()> {
    publisher
        .publish(content)
        .await
        .map_err(|e| PosterError::Publish(format!("{:#}", e)))
}
