use std::time::Duration;

use tracing::warn;

use crate::domain::{NewsItem, ScoredItem, SourceKind};
use crate::errors::{JournalistError, JournalistResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::NewsRepository;

pub const ITEM_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

pub struct SqliteNewsRepository {
    storage: SqliteStorage,
}

impl SqliteNewsRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl NewsRepository for SqliteNewsRepository {
    fn put_item(
        &self,
        source: SourceKind,
        period: &str,
        item: &NewsItem,
        score: f64,
    ) -> JournalistResult<()> {
        let payload = serde_json::to_string(item)?;
        let now = self.storage.now_millis();
        let expires_at = self.storage.expires_in(ITEM_TTL);

        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO news_items (source, item_id, payload, expires_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source, item_id) DO UPDATE SET payload = excluded.payload, expires_at = excluded.expires_at",
            (source.as_str(), &item.id, &payload, expires_at),
        )?;

        tx.execute(
            "INSERT INTO ranked_items (source, period, item_id, score, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(source, period, item_id) DO UPDATE SET score = excluded.score, updated_at = excluded.updated_at",
            (source.as_str(), period, &item.id, score, now),
        )?;

        tx.commit()?;
        Ok(())
    }

    fn top_items(
        &self,
        source: SourceKind,
        period: &str,
        n: usize,
    ) -> JournalistResult<Vec<ScoredItem>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let now = self.storage.now_millis();
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let conn = self.storage.connection()?;

        // Ranked entries whose payload expired drop out of the join
        let mut stmt = conn.prepare(
            "SELECT r.item_id, r.score, i.payload
             FROM ranked_items r
             JOIN news_items i ON i.source = r.source AND i.item_id = r.item_id
             WHERE r.source = ?1 AND r.period = ?2 AND i.expires_at > ?3
             ORDER BY r.score DESC, r.item_id ASC
             LIMIT ?4",
        )?;

        let rows = stmt.query_map((source.as_str(), period, now, limit), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (item_id, score, payload) = row?;
            match serde_json::from_str::<NewsItem>(&payload) {
                Ok(item) => items.push(ScoredItem::new(item, score)),
                Err(e) => {
                    warn!(source = %source, item_id = %item_id, error = %e, "skipping undecodable item payload");
                }
            }
        }

        Ok(items)
    }

    fn category_title(&self, source: SourceKind, category: &str) -> JournalistResult<Option<String>> {
        let now = self.storage.now_millis();
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT title FROM category_titles WHERE source = ?1 AND category = ?2 AND expires_at > ?3",
        )?;

        let title = stmt.query_row((source.as_str(), category, now), |row| row.get::<_, String>(0));

        match title {
            Ok(t) if !t.trim().is_empty() => Ok(Some(t)),
            Ok(_) => Ok(None),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(JournalistError::from(e)),
        }
    }

    fn set_category_title(
        &self,
        source: SourceKind,
        category: &str,
        title: &str,
        ttl: Duration,
    ) -> JournalistResult<()> {
        let expires_at = self.storage.expires_in(ttl);
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO category_titles (source, category, title, expires_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source, category) DO UPDATE SET title = excluded.title, expires_at = excluded.expires_at",
            (source.as_str(), category, title, expires_at),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn setup_repo() -> (SqliteNewsRepository, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let storage = SqliteStorage::in_memory().unwrap().with_clock(clock.clone());
        (SqliteNewsRepository::new(storage), clock)
    }

    fn item(id: &str, title: &str) -> NewsItem {
        NewsItem::new(
            id.to_string(),
            title.to_string(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        )
        .with_url(format!("https://example.com/{id}"))
        .with_category("rust".to_string())
        .with_counts(12, 0)
    }

    fn ids(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|s| s.item.id.as_str()).collect()
    }

    #[test]
    fn test_put_and_top_items_ordered_by_score() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "A"), 0.5).unwrap();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("b", "B"), 2.0).unwrap();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("c", "C"), 1.0).unwrap();

        let top = repo.top_items(SourceKind::V2ex, "2024-05-01", 2).unwrap();
        assert_eq!(ids(&top), vec!["b", "c"]);
        assert_eq!(top[0].score, 2.0);
        assert_eq!(top[0].item, item("b", "B"));
    }

    #[test]
    fn test_put_item_is_last_write_wins() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "First"), 1.0).unwrap();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "Second"), 3.0).unwrap();

        let top = repo.top_items(SourceKind::V2ex, "2024-05-01", 10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].item.title, "Second");
        assert_eq!(top[0].score, 3.0);
    }

    #[test]
    fn test_repeated_put_is_idempotent() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "A"), 1.0).unwrap();
        let once = repo.top_items(SourceKind::V2ex, "2024-05-01", 10).unwrap();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "A"), 1.0).unwrap();
        let twice = repo.top_items(SourceKind::V2ex, "2024-05-01", 10).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_periods_and_sources_are_isolated() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "2024-05-01", &item("a", "A"), 1.0).unwrap();
        repo.put_item(SourceKind::V2ex, "2024-W18", &item("b", "B"), 1.0).unwrap();
        repo.put_item(SourceKind::HackerNews, "2024-05-01", &item("c", "C"), 1.0).unwrap();

        assert_eq!(ids(&repo.top_items(SourceKind::V2ex, "2024-05-01", 10).unwrap()), vec!["a"]);
        assert_eq!(ids(&repo.top_items(SourceKind::V2ex, "2024-W18", 10).unwrap()), vec!["b"]);
        assert_eq!(
            ids(&repo.top_items(SourceKind::HackerNews, "2024-05-01", 10).unwrap()),
            vec!["c"]
        );
    }

    #[test]
    fn test_equal_scores_break_ties_by_id() {
        let (repo, _) = setup_repo();
        for id in ["z", "m", "a"] {
            repo.put_item(SourceKind::V2ex, "p", &item(id, id), 1.0).unwrap();
        }
        let top = repo.top_items(SourceKind::V2ex, "p", 10).unwrap();
        assert_eq!(ids(&top), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_expired_payload_is_skipped() {
        let (repo, clock) = setup_repo();
        repo.put_item(SourceKind::V2ex, "2024-W18", &item("old", "Old"), 5.0).unwrap();
        clock.advance(chrono::Duration::days(6));
        repo.put_item(SourceKind::V2ex, "2024-W18", &item("new", "New"), 1.0).unwrap();
        clock.advance(chrono::Duration::days(2));

        let top = repo.top_items(SourceKind::V2ex, "2024-W18", 10).unwrap();
        assert_eq!(ids(&top), vec!["new"]);
    }

    #[test]
    fn test_undecodable_payload_is_skipped() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "p", &item("a", "A"), 1.0).unwrap();
        repo.put_item(SourceKind::V2ex, "p", &item("b", "B"), 2.0).unwrap();
        {
            let conn = repo.storage.connection().unwrap();
            conn.execute("UPDATE news_items SET payload = 'not json' WHERE item_id = 'b'", [])
                .unwrap();
        }

        let top = repo.top_items(SourceKind::V2ex, "p", 10).unwrap();
        assert_eq!(ids(&top), vec!["a"]);
    }

    #[test]
    fn test_top_items_zero_limit() {
        let (repo, _) = setup_repo();
        repo.put_item(SourceKind::V2ex, "p", &item("a", "A"), 1.0).unwrap();
        assert!(repo.top_items(SourceKind::V2ex, "p", 0).unwrap().is_empty());
    }

    #[test]
    fn test_category_title_cache_expires() {
        let (repo, clock) = setup_repo();
        assert_eq!(repo.category_title(SourceKind::V2ex, "apple").unwrap(), None);

        repo.set_category_title(SourceKind::V2ex, "apple", "Apple", Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            repo.category_title(SourceKind::V2ex, "apple").unwrap(),
            Some("Apple".to_string())
        );

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(repo.category_title(SourceKind::V2ex, "apple").unwrap(), None);
    }
}
