use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One feed item, normalized at the source boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Deduplication key, stable across fetches of the same feed.
    pub id: String,
    pub title: String,
    pub link: String,
    /// Plain text, first line only.
    pub summary: String,
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub id: String,
    pub username: String,
    pub acct: String,
}

// Object style note:
// Implementations of these traits are handed in by reference to the code that
// drives a feed cycle. They hold connection details only; anything that must
// survive a restart lives in the caller's store, never inside them.

/// Given a feed URL, return its entries in the feed's native order.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<Entry>>;
}

/// One authenticated account on a posting service.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Verify the credentials this publisher was built with.
    async fn authenticate(&self) -> Result<AccountIdentity>;

    /// Make one attempt at publishing `content`. Success means the remote
    /// service confirmed the post.
    async fn publish(&self, content: &str) -> Result<()>;
}
