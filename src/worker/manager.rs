use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{JournalistError, JournalistResult};
use crate::worker::Worker;

/// Runs workers concurrently until cancellation, then waits for all of them.
#[derive(Default)]
pub struct Manager {
    workers: Vec<Arc<dyn Worker>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, worker: Arc<dyn Worker>) {
        self.workers.push(worker);
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name().to_string()).collect()
    }

    /// Returns the first worker error, if any. A panicking worker counts as an error.
    /// Failed workers are not restarted.
    pub async fn run(self, cancel: CancellationToken) -> JournalistResult<()> {
        let mut set = JoinSet::new();

        for worker in self.workers {
            let token = cancel.clone();
            set.spawn(async move {
                let name = worker.name().to_string();
                // Inner task so a panic is reported against the worker's name
                let handle = tokio::spawn(async move { worker.run(token).await });
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(JournalistError::Worker {
                        name: name.clone(),
                        message: e.to_string(),
                    }),
                };
                (name, result)
            });
        }

        cancel.cancelled().await;
        info!(workers = set.len(), "waiting for workers to stop");

        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!(worker = %name, "worker exited"),
                Ok((name, Err(e))) => {
                    error!(worker = %name, error = %e, "worker failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!(error = %e, "worker task failed");
                    first_error.get_or_insert(JournalistError::Worker {
                        name: "unknown".to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
