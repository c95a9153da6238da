use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::Clock;
use crate::errors::{JournalistError, JournalistResult};
use crate::storage::traits::StoreMaintenance;
use crate::worker::{run_periodic, PeriodicJob, Worker};

/// Periodically deletes expired rows and, optionally, stale ranked entries.
pub struct JanitorWorker<M: StoreMaintenance> {
    store: M,
    interval: Duration,
    /// Zero disables ranked pruning
    ranked_retention: Duration,
    clock: Arc<dyn Clock>,
}

impl<M: StoreMaintenance> JanitorWorker<M> {
    pub fn new(store: M, interval: Duration, ranked_retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            interval,
            ranked_retention,
            clock,
        }
    }
}

/// Purge expired rows, then prune ranked entries older than `retention` when it is non-zero.
/// Returns the number of deleted rows.
pub fn sweep<M: StoreMaintenance + ?Sized>(
    store: &M,
    retention: Duration,
    now: chrono::DateTime<chrono::Utc>,
) -> JournalistResult<usize> {
    let purged = store.purge_expired()?;

    let pruned = if retention.is_zero() {
        0
    } else {
        let retention = chrono::Duration::from_std(retention)
            .map_err(|e| JournalistError::Config(format!("ranked retention out of range: {e}")))?;
        store.prune_ranked_before(now - retention)?
    };

    info!(
        items = purged.items,
        published_flags = purged.published_flags,
        skip_markers = purged.skip_markers,
        category_titles = purged.category_titles,
        ranked_entries = pruned,
        "store sweep finished"
    );

    Ok(purged.total() + pruned)
}

#[async_trait]
impl<M: StoreMaintenance> PeriodicJob for JanitorWorker<M> {
    fn name(&self) -> &str {
        "janitor"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn tick(&self) -> JournalistResult<()> {
        sweep(&self.store, self.ranked_retention, self.clock.now()).map(|_| ())
    }
}

#[async_trait]
impl<M: StoreMaintenance> Worker for JanitorWorker<M> {
    fn name(&self) -> &str {
        "janitor"
    }

    async fn run(&self, cancel: CancellationToken) -> JournalistResult<()> {
        run_periodic(self, &cancel).await;
        Ok(())
    }
}
