use crate::formatter;
use crate::rss_utils;
use crate::types::{
    FeedConfig, FeedUpdate, PosterError, Result, DEFAULT_MAX_POST_AGE_DAYS, DEFAULT_POST_FORMAT,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// CRUD over the `feeds` table. Feeds are never deleted here.
pub struct FeedManager {
    db: SqlitePool,
}

impl FeedManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert when `update.id` is `None`, otherwise overwrite only the fields
    /// that are set. Returns the feed id.
    pub async fn save_feed(&self, update: FeedUpdate) -> Result<i64> {
        validate_update(&update)?;

        match update.id {
            None => self.add_feed(update).await,
            Some(id) => {
                self.update_feed(id, update).await?;
                Ok(id)
            }
        }
    }

    async fn add_feed(&self, update: FeedUpdate) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO feeds (url, instance_url, access_token, max_post_age_days, toot_format)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(update.feed_url.unwrap_or_default())
        .bind(update.instance_url.unwrap_or_default())
        .bind(update.access_token.unwrap_or_default())
        .bind(i64::from(
            update.max_post_age_days.unwrap_or(DEFAULT_MAX_POST_AGE_DAYS),
        ))
        .bind(
            update
                .post_format
                .unwrap_or_else(|| DEFAULT_POST_FORMAT.to_string()),
        )
        .execute(&self.db)
        .await?;

        let feed_id = result.last_insert_rowid();
        info!("Added new feed: {}", feed_id);
        Ok(feed_id)
    }

    async fn update_feed(&self, feed_id: i64, update: FeedUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE feeds
            SET url = COALESCE(?, url),
                instance_url = COALESCE(?, instance_url),
                access_token = COALESCE(?, access_token),
                max_post_age_days = COALESCE(?, max_post_age_days),
                toot_format = COALESCE(?, toot_format)
            WHERE id = ?
            "#,
        )
        .bind(update.feed_url)
        .bind(update.instance_url)
        .bind(update.access_token)
        .bind(update.max_post_age_days.map(i64::from))
        .bind(update.post_format)
        .bind(feed_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PosterError::FeedNotFound { id: feed_id });
        }

        info!("Updated feed with ID {}", feed_id);
        Ok(())
    }

    pub async fn get_feed(&self, feed_id: i64) -> Result<FeedConfig> {
        let row = sqlx::query("SELECT * FROM feeds WHERE id = ?")
            .bind(feed_id)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => feed_from_row(&row),
            None => Err(PosterError::FeedNotFound { id: feed_id }),
        }
    }

    pub async fn list_feeds(&self) -> Result<Vec<FeedConfig>> {
        let rows = sqlx::query("SELECT * FROM feeds ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        rows.iter().map(feed_from_row).collect()
    }
}

fn validate_update(update: &FeedUpdate) -> Result<()> {
    for (name, value) in [
        ("feed URL", &update.feed_url),
        ("instance URL", &update.instance_url),
    ] {
        if let Some(value) = value {
            if !rss_utils::url::is_http_url(value) {
                return Err(PosterError::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, value
                )));
            }
        }
    }

    if let Some(format) = &update.post_format {
        formatter::validate_template(format)?;
    }

    Ok(())
}

/// Columns are nullable in databases created by older tools, so missing
/// values fall back to the same defaults an insert would use.
fn feed_from_row(row: &SqliteRow) -> Result<FeedConfig> {
    let max_post_age_days: Option<i64> = row.try_get("max_post_age_days")?;

    Ok(FeedConfig {
        id: row.try_get("id")?,
        feed_url: row.try_get::<Option<String>, _>("url")?.unwrap_or_default(),
        instance_url: row
            .try_get::<Option<String>, _>("instance_url")?
            .unwrap_or_default(),
        access_token: row
            .try_get::<Option<String>, _>("access_token")?
            .unwrap_or_default(),
        max_post_age_days: max_post_age_days
            .map(|days| u32::try_from(days.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_MAX_POST_AGE_DAYS),
        post_format: row
            .try_get::<Option<String>, _>("toot_format")?
            .unwrap_or_else(|| DEFAULT_POST_FORMAT.to_string()),
    })
}
