use async_trait::async_trait;

use crate::domain::{NewsItem, SourceKind};
use crate::errors::JournalistResult;

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Identifies this source
    fn kind(&self) -> SourceKind;

    /// Fetch up to `limit` items of one node or list. A zero limit means no limit.
    async fn fetch(&self, category_or_list: &str, limit: usize) -> JournalistResult<Vec<NewsItem>>;

    /// Human-friendly title of a category, when the source has one
    async fn category_title(&self, _category: &str) -> JournalistResult<Option<String>> {
        Ok(None)
    }
}
