use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forum topic or story normalized across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Forum node name or derived story type
    pub category: String,
    /// Replies or comment count
    pub engagement_count: i64,
    /// Source specific, upvote points for the link aggregator
    pub secondary_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
}

impl NewsItem {
    pub fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            url: String::new(),
            category: String::new(),
            engagement_count: 0,
            secondary_count: 0,
            created_at,
            content: String::new(),
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_category(mut self, category: String) -> Self {
        self.category = category;
        self
    }

    pub fn with_counts(mut self, engagement_count: i64, secondary_count: i64) -> Self {
        self.engagement_count = engagement_count;
        self.secondary_count = secondary_count;
        self
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: NewsItem,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item: NewsItem, score: f64) -> Self {
        Self { item, score }
    }
}
