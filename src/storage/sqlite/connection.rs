use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{Clock, SystemClock};
use crate::errors::{JournalistError, JournalistResult};
use crate::storage::traits::{PurgeStats, StoreMaintenance, StoreStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS news_items (
    source TEXT NOT NULL,
    item_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (source, item_id)
);

CREATE TABLE IF NOT EXISTS ranked_items (
    source TEXT NOT NULL,
    period TEXT NOT NULL,
    item_id TEXT NOT NULL,
    score REAL NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (source, period, item_id)
);

CREATE INDEX IF NOT EXISTS idx_ranked_items_score ON ranked_items(source, period, score DESC);

CREATE TABLE IF NOT EXISTS published_flags (
    channel TEXT NOT NULL,
    period TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (channel, period)
);

CREATE TABLE IF NOT EXISTS skip_markers (
    channel TEXT NOT NULL,
    item_id TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (channel, item_id)
);

CREATE TABLE IF NOT EXISTS category_titles (
    source TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (source, category)
);
"#;

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> JournalistResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> JournalistResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> JournalistResult<Self> {
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, JournalistError> {
        self.conn
            .lock()
            .map_err(|_| JournalistError::Database(rusqlite::Error::InvalidQuery))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current time in epoch milliseconds
    pub fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Expiry timestamp `ttl` from now, in epoch milliseconds
    pub fn expires_in(&self, ttl: Duration) -> i64 {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.now_millis().saturating_add(ttl_millis)
    }

    fn count<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> JournalistResult<usize> {
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

impl StoreMaintenance for SqliteStorage {
    fn purge_expired(&self) -> JournalistResult<PurgeStats> {
        let now = self.now_millis();
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let stats = PurgeStats {
            items: tx.execute("DELETE FROM news_items WHERE expires_at <= ?1", [now])?,
            published_flags: tx.execute("DELETE FROM published_flags WHERE expires_at <= ?1", [now])?,
            skip_markers: tx.execute("DELETE FROM skip_markers WHERE expires_at <= ?1", [now])?,
            category_titles: tx.execute("DELETE FROM category_titles WHERE expires_at <= ?1", [now])?,
        };

        tx.commit()?;
        Ok(stats)
    }

    fn prune_ranked_before(&self, cutoff: DateTime<Utc>) -> JournalistResult<usize> {
        let conn = self.connection()?;
        let removed = conn.execute(
            "DELETE FROM ranked_items WHERE updated_at < ?1",
            [cutoff.timestamp_millis()],
        )?;
        Ok(removed)
    }

    fn stats(&self) -> JournalistResult<StoreStats> {
        let now = self.now_millis();
        let conn = self.connection()?;

        Ok(StoreStats {
            items: Self::count(&conn, "SELECT COUNT(*) FROM news_items WHERE expires_at > ?1", [now])?,
            ranked_entries: Self::count(&conn, "SELECT COUNT(*) FROM ranked_items", ())?,
            dangling_ranked_entries: Self::count(
                &conn,
                "SELECT COUNT(*) FROM ranked_items r WHERE NOT EXISTS (
                    SELECT 1 FROM news_items i
                    WHERE i.source = r.source AND i.item_id = r.item_id AND i.expires_at > ?1
                )",
                [now],
            )?,
            published_flags: Self::count(
                &conn,
                "SELECT COUNT(*) FROM published_flags WHERE expires_at > ?1",
                [now],
            )?,
            skip_markers: Self::count(&conn, "SELECT COUNT(*) FROM skip_markers WHERE expires_at > ?1", [now])?,
            category_titles: Self::count(
                &conn,
                "SELECT COUNT(*) FROM category_titles WHERE expires_at > ?1",
                [now],
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ManualClock, NewsItem, SourceKind};
    use crate::storage::sqlite::{SqliteChannelStateRepository, SqliteNewsRepository};
    use crate::storage::traits::{ChannelStateRepository, NewsRepository};
    use chrono::TimeZone;

    fn setup() -> (SqliteStorage, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let storage = SqliteStorage::in_memory().unwrap().with_clock(clock.clone());
        (storage, clock)
    }

    #[test]
    fn test_create_in_memory_storage() {
        let (storage, _) = setup();
        let conn = storage.connection().unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('news_items', 'ranked_items', 'published_flags', 'skip_markers', 'category_titles')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn test_expires_in_saturates() {
        let (storage, _) = setup();
        assert_eq!(storage.expires_in(Duration::MAX), i64::MAX);
    }

    #[test]
    fn test_purge_expired_removes_only_stale_rows() {
        let (storage, clock) = setup();
        let news = SqliteNewsRepository::new(storage.clone());
        let state = SqliteChannelStateRepository::new(storage.clone());

        let item = NewsItem::new("1".to_string(), "t".to_string(), storage.now());
        news.put_item(SourceKind::V2ex, "2024-05-01", &item, 1.0).unwrap();
        state.mark_skipped("c", "1", Duration::from_secs(3600)).unwrap();
        state.mark_published("c", "2024-05-01").unwrap();

        clock.advance(chrono::Duration::hours(2));
        let purged = storage.purge_expired().unwrap();
        assert_eq!(purged.skip_markers, 1);
        assert_eq!(purged.items, 0);
        assert_eq!(purged.published_flags, 0);

        clock.advance(chrono::Duration::days(8));
        let purged = storage.purge_expired().unwrap();
        assert_eq!(purged.items, 1);
        assert_eq!(purged.total(), 1);
    }

    #[test]
    fn test_prune_ranked_and_stats() {
        let (storage, clock) = setup();
        let news = SqliteNewsRepository::new(storage.clone());

        let old = NewsItem::new("old".to_string(), "old".to_string(), storage.now());
        news.put_item(SourceKind::V2ex, "2024-05-01", &old, 1.0).unwrap();

        clock.advance(chrono::Duration::days(8));
        let fresh = NewsItem::new("fresh".to_string(), "fresh".to_string(), storage.now());
        news.put_item(SourceKind::V2ex, "2024-05-09", &fresh, 1.0).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.items, 1);
        assert_eq!(stats.ranked_entries, 2);
        assert_eq!(stats.dangling_ranked_entries, 1);

        let removed = storage
            .prune_ranked_before(storage.now() - chrono::Duration::days(1))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(storage.stats().unwrap().ranked_entries, 1);
    }
}
