pub mod hackernews;
pub mod html;
pub mod registry;
pub mod traits;
pub mod v2ex;

pub use hackernews::HackerNewsSource;
pub use registry::SourceRegistry;
pub use traits::NewsSource;
pub use v2ex::V2exSource;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Creation time from a unix timestamp in seconds.
/// Missing, zero or out-of-range stamps fall back to `fetched_at`.
pub(crate) fn created_at_or(timestamp: i64, fetched_at: DateTime<Utc>, item_id: u64) -> DateTime<Utc> {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(created) if timestamp > 0 => created,
        _ => {
            debug!(item_id, timestamp, "no creation time, using fetch time");
            fetched_at
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_at_falls_back_to_fetch_time() {
        let fetched = DateTime::<Utc>::from_timestamp(1714564800, 0).unwrap();
        assert_eq!(created_at_or(1714557600, fetched, 1).timestamp(), 1714557600);
        assert_eq!(created_at_or(0, fetched, 1), fetched);
        assert_eq!(created_at_or(-5, fetched, 1), fetched);
        assert_eq!(created_at_or(i64::MAX, fetched, 1), fetched);
    }
}
