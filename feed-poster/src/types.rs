pub use interfaces::defs::{AccountIdentity, Entry, FeedSource, Publisher};

pub const DEFAULT_MAX_POST_AGE_DAYS: u32 = 30;

/// Stored with a literal backslash-n; the formatter turns it into newlines.
pub const DEFAULT_POST_FORMAT: &str = r"{title}\n\n{link}\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub id: i64,
    pub feed_url: String,
    pub instance_url: String,
    pub access_token: String,
    pub max_post_age_days: u32,
    pub post_format: String,
}

/// Fields for a feed save. `id: None` inserts, otherwise only the `Some`
/// fields overwrite the stored row.
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    pub id: Option<i64>,
    pub feed_url: Option<String>,
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub max_post_age_days: Option<u32>,
    pub post_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("feed-poster/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// 0 means no limit.
    pub max_posts: usize,
    pub dry_run: bool,
}

/// Outcome of one fetch → filter → publish pass over a single feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feed_id: i64,
    pub fetched: usize,
    pub published: usize,
    pub failed: usize,
    pub already_posted: usize,
    pub too_old: usize,
    pub deferred: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("Failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Authentication against {instance_url} failed: {reason}")]
    Auth { instance_url: String, reason: String },

    #[error("Invalid post format: {0}")]
    Format(String),

    #[error("Failed to publish: {0}")]
    Publish(String),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed not found: {id}")]
    FeedNotFound { id: i64 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PosterError {
    /// Only a broken store stops the process; bookkeeping can't be trusted
    /// after that.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PosterError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, PosterError>;
