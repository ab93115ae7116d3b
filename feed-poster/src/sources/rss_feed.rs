use crate::types::{Entry, FeedSource, FetchConfig, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::info;

/// Feed source backed by HTTP + feed-rs.
pub struct RssFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
            parser: FeedParser::new(),
        })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self, feed_url: &str) -> anyhow::Result<Vec<Entry>> {
        let content = self.fetcher.fetch_feed(feed_url).await?;
        let entries = self.parser.parse_feed(&content)?;

        info!("Pulled {} entries from feed {}", entries.len(), feed_url);
        Ok(entries)
    }
}
