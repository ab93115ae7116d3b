use crate::types::Entry;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyPosted,
    TooOld,
    /// Over this cycle's post limit; eligible again next cycle.
    CapReached,
}

#[derive(Debug, Default)]
pub struct Selection {
    /// Oldest first, in publication order.
    pub selected: Vec<Entry>,
    pub skipped: Vec<(Entry, SkipReason)>,
}

impl Selection {
    pub fn count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|(_, r)| *r == reason).count()
    }
}

/// Decides which fetched entries get published this cycle, and in what order.
pub struct FilterStage {
    max_post_age_days: u32,
    max_posts: usize,
}

impl FilterStage {
    pub fn new(max_post_age_days: u32) -> Self {
        Self {
            max_post_age_days,
            max_posts: 0,
        }
    }

    /// 0 disables the limit.
    pub fn with_max_posts(mut self, max_posts: usize) -> Self {
        self.max_posts = max_posts;
        self
    }

    /// `entries` come in the feed's native order (usually newest first).
    /// Skipped entries are never recorded anywhere, so an entry that is too
    /// old or over the limit stays eligible if settings change later.
    pub fn select<F>(&self, mut entries: Vec<Entry>, now: DateTime<Utc>, is_posted: F) -> Selection
    where
        F: Fn(&str) -> bool,
    {
        entries.reverse();
        entries.sort_by_key(|entry| entry.published_at);

        let cutoff = now - Duration::days(i64::from(self.max_post_age_days));
        let mut selection = Selection::default();
        let mut selected_ids = HashSet::new();

        for entry in entries {
            let reason = if is_posted(&entry.id) || selected_ids.contains(&entry.id) {
                Some(SkipReason::AlreadyPosted)
            } else if entry.published_at <= cutoff {
                Some(SkipReason::TooOld)
            } else if self.max_posts != 0 && selection.selected.len() >= self.max_posts {
                Some(SkipReason::CapReached)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!("Skipping entry {} ({:?})", entry.id, reason);
                    selection.skipped.push((entry, reason));
                }
                None => {
                    selected_ids.insert(entry.id.clone());
                    selection.selected.push(entry);
                }
            }
        }

        selection
    }
}
