use crate::rss_utils::html;
use crate::types::{Entry, PosterError, Result};
use feed_rs::parser;
use tracing::{debug, warn};

/// Turns a raw RSS/Atom/JSON Feed document into normalized entries.
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed(&self, content: &[u8]) -> Result<Vec<Entry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| PosterError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let entries: Vec<Entry> = feed
            .entries
            .into_iter()
            .filter_map(|entry| self.normalize_entry(entry))
            .collect();

        if entries.len() < total {
            warn!("Dropped {} of {} entries that could not be normalized", total - entries.len(), total);
        }

        Ok(entries)
    }

    /// Entries without an id, a link or a timestamp can't be deduplicated or
    /// age-checked safely and are dropped.
    fn normalize_entry(&self, entry: feed_rs::model::Entry) -> Option<Entry> {
        let id = entry.id.trim().to_string();
        let title = entry.title.map(|t| t.content).unwrap_or_default();

        if id.is_empty() {
            warn!("Skipping entry without an id: {}", title);
            return None;
        }

        let link = entry
            .links
            .iter()
            .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|link| link.href.clone());
        let Some(link) = link else {
            warn!("Skipping entry {} without a link: {}", id, title);
            return None;
        };

        let Some(published_at) = entry.published.or(entry.updated) else {
            warn!("Skipping entry {} without a publication date: {}", id, title);
            return None;
        };

        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|raw| html::summarize(&raw))
            .unwrap_or_default();

        let tags = entry.categories.into_iter().map(|c| c.term).collect();

        Some(Entry {
            id,
            title,
            link,
            summary,
            tags,
            published_at: published_at.with_timezone(&chrono::Utc),
        })
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}
