pub mod builder;
pub mod collector;
pub mod janitor;
pub mod manager;
pub mod shutdown;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::JournalistResult;

pub use builder::BuilderWorker;
pub use collector::CollectorWorker;
pub use janitor::JanitorWorker;
pub use manager::Manager;
pub use shutdown::{cancel_on_shutdown, shutdown_signal};

/// A long-running unit supervised by the [`Manager`].
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;

    /// Run until `cancel` fires. Returning early ends the worker for good.
    async fn run(&self, cancel: CancellationToken) -> JournalistResult<()>;
}

/// Work repeated on a fixed interval.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    fn name(&self) -> &str;

    fn interval(&self) -> Duration;

    async fn tick(&self) -> JournalistResult<()>;
}

/// Tick immediately, then once per interval until cancelled.
///
/// A failed tick is logged and the loop carries on. No tick starts after
/// cancellation, though one already running completes.
pub async fn run_periodic<J: PeriodicJob + ?Sized>(job: &J, cancel: &CancellationToken) {
    let name = job.name();
    info!(worker = %name, interval = ?job.interval(), "worker started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if let Err(e) = job.tick().await {
            error!(worker = %name, error = %e, "tick failed");
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep(job.interval()) => {}
        }
    }

    info!(worker = %name, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JournalistError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingJob {
        ticks: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PeriodicJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_secs(60)
        }

        async fn tick(&self) -> JournalistResult<()> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(JournalistError::InvalidInput("tick".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn job(fail: bool) -> Arc<CountingJob> {
        Arc::new(CountingJob {
            ticks: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_on_interval() {
        let job = job(false);
        let cancel = CancellationToken::new();

        let handle = {
            let job = job.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { run_periodic(job.as_ref(), &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(job.ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(job.ticks.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(job.ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_tick_after_cancellation() {
        let job = job(false);
        let cancel = CancellationToken::new();
        cancel.cancel();

        run_periodic(job.as_ref(), &cancel).await;
        assert_eq!(job.ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_keeps_looping() {
        let job = job(true);
        let cancel = CancellationToken::new();

        let handle = {
            let job = job.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { run_periodic(job.as_ref(), &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(61)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(job.ticks.load(Ordering::SeqCst), 2);
    }
}
