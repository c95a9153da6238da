use std::time::Duration;

use crate::errors::JournalistResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ChannelStateRepository;

pub const PUBLISHED_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

pub struct SqliteChannelStateRepository {
    storage: SqliteStorage,
}

impl SqliteChannelStateRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ChannelStateRepository for SqliteChannelStateRepository {
    fn is_published(&self, channel: &str, period: &str) -> JournalistResult<bool> {
        let now = self.storage.now_millis();
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM published_flags WHERE channel = ?1 AND period = ?2 AND expires_at > ?3)",
        )?;
        let published: bool = stmt.query_row((channel, period, now), |row| row.get(0))?;
        Ok(published)
    }

    fn mark_published(&self, channel: &str, period: &str) -> JournalistResult<bool> {
        let now = self.storage.now_millis();
        let expires_at = self.storage.expires_in(PUBLISHED_TTL);
        let conn = self.storage.connection()?;

        // Only an absent or expired flag can be claimed
        let changed = conn.execute(
            "INSERT INTO published_flags (channel, period, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(channel, period) DO UPDATE SET expires_at = excluded.expires_at
             WHERE published_flags.expires_at <= ?4",
            (channel, period, expires_at, now),
        )?;

        Ok(changed == 1)
    }

    fn is_skipped(&self, channel: &str, item_id: &str) -> JournalistResult<bool> {
        let now = self.storage.now_millis();
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM skip_markers WHERE channel = ?1 AND item_id = ?2 AND expires_at > ?3)",
        )?;
        let skipped: bool = stmt.query_row((channel, item_id, now), |row| row.get(0))?;
        Ok(skipped)
    }

    fn mark_skipped(&self, channel: &str, item_id: &str, duration: Duration) -> JournalistResult<()> {
        if duration.is_zero() {
            return Ok(());
        }

        let expires_at = self.storage.expires_in(duration);
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO skip_markers (channel, item_id, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(channel, item_id) DO UPDATE SET expires_at = excluded.expires_at",
            (channel, item_id, expires_at),
        )?;
        Ok(())
    }
}
