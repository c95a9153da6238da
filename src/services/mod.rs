pub mod collector_service;
pub mod digest_service;
pub mod publish_service;

pub use collector_service::{CollectStats, CollectorService};
pub use digest_service::{BuildOutcome, DigestService, ForceOptions};
pub use publish_service::{PublishService, Publisher};

use std::sync::Arc;

use crate::errors::JournalistResult;

/// Run a synchronous repository call on the blocking pool.
/// The SQLite connection lock is then never held on an async worker thread.
pub(crate) async fn run_blocking<R, T, F>(repository: &Arc<R>, call: F) -> JournalistResult<T>
where
    R: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&R) -> JournalistResult<T> + Send + 'static,
{
    let repository = Arc::clone(repository);
    tokio::task::spawn_blocking(move || call(&repository)).await?
}
