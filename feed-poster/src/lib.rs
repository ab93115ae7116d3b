pub mod types;
pub mod config;
pub mod database;
pub mod feed_manager;
pub mod state;
pub mod fetcher;
pub mod parser;
pub mod rss_utils;
pub mod sources;
pub mod formatter;
pub mod processing;
pub mod mastodon;
pub mod pipeline;
pub mod poster;

pub use types::*;
pub use database::Database;
pub use feed_manager::FeedManager;
pub use state::EntryStore;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::RssFeedSource;
pub use mastodon::MastodonClient;
pub use pipeline::FeedProcessor;
pub use poster::{FeedPoster, FeedSelection};
