use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::Clock;
use crate::errors::JournalistResult;
use crate::services::{BuildOutcome, DigestService};
use crate::storage::traits::{ChannelStateRepository, NewsRepository};
use crate::worker::{run_periodic, PeriodicJob, Worker};

/// Builds one channel's digest on a fixed interval.
pub struct BuilderWorker<N: NewsRepository, S: ChannelStateRepository> {
    name: String,
    service: DigestService<N, S>,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl<N: NewsRepository + 'static, S: ChannelStateRepository + 'static> BuilderWorker<N, S> {
    pub fn new(service: DigestService<N, S>, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: format!("builder:{}", service.channel().name),
            service,
            interval,
            clock,
        }
    }
}

#[async_trait]
impl<N: NewsRepository + 'static, S: ChannelStateRepository + 'static> PeriodicJob for BuilderWorker<N, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn tick(&self) -> JournalistResult<()> {
        match self.service.build_once(self.clock.now()).await? {
            BuildOutcome::Written { path, .. } => {
                debug!(worker = %self.name, path = %path.display(), "build tick wrote a digest")
            }
            outcome => debug!(worker = %self.name, outcome = ?outcome, "build tick finished"),
        }
        Ok(())
    }
}

#[async_trait]
impl<N: NewsRepository + 'static, S: ChannelStateRepository + 'static> Worker for BuilderWorker<N, S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, cancel: CancellationToken) -> JournalistResult<()> {
        run_periodic(self, &cancel).await;
        Ok(())
    }
}
