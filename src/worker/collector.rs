use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::Clock;
use crate::errors::JournalistResult;
use crate::services::CollectorService;
use crate::storage::traits::NewsRepository;
use crate::worker::{run_periodic, PeriodicJob, Worker};

/// Polls one source on a fixed interval.
pub struct CollectorWorker<R: NewsRepository> {
    name: String,
    service: CollectorService<R>,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl<R: NewsRepository + 'static> CollectorWorker<R> {
    pub fn new(service: CollectorService<R>, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: format!("collector:{}", service.source_kind()),
            service,
            interval,
            clock,
        }
    }
}

#[async_trait]
impl<R: NewsRepository + 'static> PeriodicJob for CollectorWorker<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn tick(&self) -> JournalistResult<()> {
        self.service.collect_once(self.clock.now()).await;
        Ok(())
    }
}

#[async_trait]
impl<R: NewsRepository + 'static> Worker for CollectorWorker<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, cancel: CancellationToken) -> JournalistResult<()> {
        run_periodic(self, &cancel).await;
        Ok(())
    }
}
