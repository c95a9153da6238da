use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{NewsItem, ScoredItem, SourceKind};
use crate::errors::JournalistResult;

/// Item payloads and their ranked membership per (source, period).
#[cfg_attr(test, mockall::automock)]
pub trait NewsRepository: Send + Sync {
    /// Upsert the payload (7 day expiry) and its score in the period's ranking
    fn put_item(
        &self,
        source: SourceKind,
        period: &str,
        item: &NewsItem,
        score: f64,
    ) -> JournalistResult<()>;

    /// Up to `n` live items, highest score first. Entries whose payload expired are skipped.
    fn top_items(
        &self,
        source: SourceKind,
        period: &str,
        n: usize,
    ) -> JournalistResult<Vec<ScoredItem>>;

    fn category_title(&self, source: SourceKind, category: &str) -> JournalistResult<Option<String>>;

    fn set_category_title(
        &self,
        source: SourceKind,
        category: &str,
        title: &str,
        ttl: Duration,
    ) -> JournalistResult<()>;
}

/// Per-channel publication flags and skip markers.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelStateRepository: Send + Sync {
    fn is_published(&self, channel: &str, period: &str) -> JournalistResult<bool>;

    /// Set the flag for 30 days. Returns false when another caller already holds
    /// an unexpired flag for the same period.
    fn mark_published(&self, channel: &str, period: &str) -> JournalistResult<bool>;

    fn is_skipped(&self, channel: &str, item_id: &str) -> JournalistResult<bool>;

    /// No-op for a zero duration
    fn mark_skipped(&self, channel: &str, item_id: &str, duration: Duration) -> JournalistResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub items: usize,
    pub published_flags: usize,
    pub skip_markers: usize,
    pub category_titles: usize,
}

impl PurgeStats {
    pub fn total(&self) -> usize {
        self.items + self.published_flags + self.skip_markers + self.category_titles
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub items: usize,
    pub ranked_entries: usize,
    pub dangling_ranked_entries: usize,
    pub published_flags: usize,
    pub skip_markers: usize,
    pub category_titles: usize,
}

/// Housekeeping over expired rows and ranked entries.
pub trait StoreMaintenance: Send + Sync {
    fn purge_expired(&self) -> JournalistResult<PurgeStats>;

    /// Delete ranked entries not refreshed since `cutoff`
    fn prune_ranked_before(&self, cutoff: DateTime<Utc>) -> JournalistResult<usize>;

    fn stats(&self) -> JournalistResult<StoreStats>;
}
