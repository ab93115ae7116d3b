use crate::types::{FetchConfig, PosterError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// One-shot HTTP retrieval of feed documents. Failures are reported to the
/// caller as-is; the next scheduled cycle is the retry.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        let parsed_url = Url::parse(url)?;

        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(PosterError::Config(format!(
                "unsupported feed URL scheme: {}",
                parsed_url.scheme()
            )));
        }

        debug!("Fetching feed: {}", url);

        let response = self.client.get(parsed_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PosterError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let max_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            let content_length = usize::try_from(content_length).unwrap_or(usize::MAX);
            if content_length > max_bytes {
                return Err(PosterError::FeedTooLarge {
                    size_mb: content_length / (1024 * 1024),
                });
            }
        }

        let content = response.bytes().await?;
        if content.len() > max_bytes {
            return Err(PosterError::FeedTooLarge {
                size_mb: content.len() / (1024 * 1024),
            });
        }

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );

        Ok(content.to_vec())
    }
}
