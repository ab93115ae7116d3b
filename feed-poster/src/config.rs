use crate::formatter;
use crate::types::{FeedConfig, PosterError, Result, DEFAULT_MAX_POST_AGE_DAYS, DEFAULT_POST_FORMAT};
use std::env;

pub const FEED_URL: &str = "FEED_URL";
pub const INSTANCE_URL: &str = "INSTANCE_URL";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const MAX_POST_AGE_DAYS: &str = "MAX_POST_AGE_DAYS";
pub const POST_FORMAT: &str = "POST_FORMAT";

/// Single feed described entirely by environment variables. It isn't stored
/// in the catalog; its id is always 0.
pub fn feed_from_env() -> Result<FeedConfig> {
    feed_from_lookup(|name| env::var(name).ok())
}

pub fn feed_from_lookup<F>(lookup: F) -> Result<FeedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &str| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| PosterError::Config(format!("{} environment variable is not set", name)))
    };

    let max_post_age_days = match lookup(MAX_POST_AGE_DAYS) {
        Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
            PosterError::Config(format!("{} must be a non-negative integer: {}", MAX_POST_AGE_DAYS, e))
        })?,
        None => DEFAULT_MAX_POST_AGE_DAYS,
    };

    let post_format = lookup(POST_FORMAT).unwrap_or_else(|| DEFAULT_POST_FORMAT.to_string());
    formatter::validate_template(&post_format)?;

    Ok(FeedConfig {
        id: 0,
        feed_url: required(FEED_URL)?,
        instance_url: required(INSTANCE_URL)?,
        access_token: required(ACCESS_TOKEN)?,
        max_post_age_days,
        post_format,
    })
}
