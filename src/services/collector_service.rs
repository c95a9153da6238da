use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{popularity_score, Frequency, NewsItem, SourceKind};
use crate::errors::JournalistResult;
use crate::services::run_blocking;
use crate::sources::NewsSource;
use crate::storage::traits::NewsRepository;

pub const CATEGORY_TITLE_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub fetched: usize,
    pub stored: usize,
    /// Items scoring zero, never stored
    pub discarded: usize,
    pub failed_fetches: usize,
    pub failed_writes: usize,
}

/// Polls one source and ranks what it returns under the daily and weekly periods.
pub struct CollectorService<R: NewsRepository> {
    source: Arc<dyn NewsSource>,
    repository: Arc<R>,
    categories: Vec<String>,
    limit_per_category: usize,
}

impl<R: NewsRepository + 'static> CollectorService<R> {
    pub fn new(
        source: Arc<dyn NewsSource>,
        repository: R,
        categories: Vec<String>,
        limit_per_category: usize,
    ) -> Self {
        Self {
            source,
            repository: Arc::new(repository),
            categories,
            limit_per_category,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Cache display titles for categories that have none yet. Best effort.
    pub async fn refresh_category_titles(&self) -> usize {
        let kind = self.source.kind();
        let mut cached = 0;

        for category in &self.categories {
            let lookup = {
                let category = category.clone();
                run_blocking(&self.repository, move |repo| repo.category_title(kind, &category)).await
            };
            match lookup {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    warn!(source = %kind, category = %category, error = %e, "category title lookup failed");
                    continue;
                }
            }

            match self.source.category_title(category).await {
                Ok(Some(title)) => {
                    let category_key = category.clone();
                    let stored = run_blocking(&self.repository, move |repo| {
                        repo.set_category_title(kind, &category_key, &title, CATEGORY_TITLE_TTL)
                    })
                    .await;
                    match stored {
                        Ok(()) => cached += 1,
                        Err(e) => {
                            warn!(source = %kind, category = %category, error = %e, "caching category title failed")
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(source = %kind, category = %category, error = %e, "category title fetch failed")
                }
            }
        }

        cached
    }

    /// Score and store `items` under every period bucket for `now`
    pub async fn store_items(
        &self,
        items: Vec<NewsItem>,
        now: DateTime<Utc>,
        stats: &mut CollectStats,
    ) -> JournalistResult<()> {
        let kind = self.source.kind();
        let periods: Vec<String> = Frequency::ALL.iter().map(|f| f.period_key(now)).collect();

        let batch = run_blocking(&self.repository, move |repo| {
            let mut batch = CollectStats::default();
            for item in &items {
                let score = popularity_score(kind.ranking_count(item), item.created_at, now);
                if score <= 0.0 {
                    batch.discarded += 1;
                    continue;
                }

                let mut stored = true;
                for period in &periods {
                    if let Err(e) = repo.put_item(kind, period, item, score) {
                        warn!(source = %kind, item_id = %item.id, period = %period, error = %e, "storing item failed");
                        stored = false;
                    }
                }

                if stored {
                    batch.stored += 1;
                } else {
                    batch.failed_writes += 1;
                }
            }
            Ok(batch)
        })
        .await?;

        stats.stored += batch.stored;
        stats.discarded += batch.discarded;
        stats.failed_writes += batch.failed_writes;
        Ok(())
    }

    /// One collection pass over every category, one at a time
    pub async fn collect_once(&self, now: DateTime<Utc>) -> CollectStats {
        let kind = self.source.kind();
        let mut stats = CollectStats::default();

        self.refresh_category_titles().await;

        for category in &self.categories {
            let items = match self.source.fetch(category, self.limit_per_category).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(source = %kind, category = %category, error = %e, "fetch failed");
                    stats.failed_fetches += 1;
                    continue;
                }
            };

            stats.fetched += items.len();
            let count = items.len();
            if let Err(e) = self.store_items(items, now, &mut stats).await {
                warn!(source = %kind, category = %category, error = %e, "storing batch failed");
                stats.failed_writes += count;
            }
        }

        info!(
            source = %kind,
            fetched = stats.fetched,
            stored = stats.stored,
            discarded = stats.discarded,
            failed_fetches = stats.failed_fetches,
            failed_writes = stats.failed_writes,
            "collection pass finished"
        );

        stats
    }
}
