use std::sync::Arc;

use crate::domain::SourceKind;
use crate::errors::{JournalistError, JournalistResult};
use crate::sources::traits::NewsSource;

/// Configured sources, at most one per kind.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn NewsSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any earlier one of the same kind
    pub fn register(&mut self, source: Arc<dyn NewsSource>) {
        self.sources.retain(|s| s.kind() != source.kind());
        self.sources.push(source);
    }

    pub fn find(&self, kind: SourceKind) -> Option<Arc<dyn NewsSource>> {
        self.sources.iter().find(|s| s.kind() == kind).cloned()
    }

    pub fn require(&self, kind: SourceKind) -> JournalistResult<Arc<dyn NewsSource>> {
        self.find(kind).ok_or_else(|| {
            JournalistError::Config(format!("source {} is not configured", kind))
        })
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewsItem;
    use async_trait::async_trait;

    struct StubSource {
        kind: SourceKind,
        label: &'static str,
    }

    #[async_trait]
    impl NewsSource for StubSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn fetch(&self, _category: &str, _limit: usize) -> JournalistResult<Vec<NewsItem>> {
            Ok(Vec::new())
        }

        async fn category_title(&self, _category: &str) -> JournalistResult<Option<String>> {
            Ok(Some(self.label.to_string()))
        }
    }

    #[tokio::test]
    async fn test_register_replaces_same_kind() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(StubSource { kind: SourceKind::V2ex, label: "first" }));
        registry.register(Arc::new(StubSource { kind: SourceKind::V2ex, label: "second" }));

        assert_eq!(registry.kinds(), vec![SourceKind::V2ex]);
        let source = registry.find(SourceKind::V2ex).unwrap();
        assert_eq!(source.category_title("x").await.unwrap(), Some("second".to_string()));
    }

    #[test]
    fn test_require_missing_source() {
        let registry = SourceRegistry::new();
        assert!(registry.find(SourceKind::HackerNews).is_none());
        assert!(matches!(
            registry.require(SourceKind::HackerNews),
            Err(JournalistError::Config(_))
        ));
    }
}
