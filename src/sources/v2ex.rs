use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::domain::{NewsItem, SourceKind};
use crate::errors::{JournalistError, JournalistResult};
use crate::sources::created_at_or;
use crate::sources::html::html_to_text;
use crate::sources::traits::NewsSource;

pub const DEFAULT_BASE_URL: &str = "https://www.v2ex.com";

#[derive(Debug, Default, Deserialize)]
struct NodeRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    replies: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    node: NodeRef,
    #[serde(default)]
    created: i64,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    #[serde(default)]
    title: String,
}

pub struct V2exSource {
    client: Client,
    base_url: String,
    token: String,
}

impl V2exSource {
    pub fn new(base_url: &str, token: &str) -> JournalistResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let base_url = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    fn to_news_item(&self, topic: Topic, fetched_at: DateTime<Utc>) -> NewsItem {
        let url = if topic.url.trim().is_empty() {
            format!("{}/t/{}", self.base_url, topic.id)
        } else {
            topic.url
        };
        let created_at = created_at_or(topic.created, fetched_at, topic.id);

        NewsItem::new(topic.id.to_string(), topic.title, created_at)
            .with_url(url)
            .with_category(topic.node.name)
            .with_counts(topic.replies, 0)
            .with_content(html_to_text(&topic.content))
    }
}

#[async_trait]
impl NewsSource for V2exSource {
    fn kind(&self) -> SourceKind {
        SourceKind::V2ex
    }

    async fn fetch(&self, category_or_list: &str, limit: usize) -> JournalistResult<Vec<NewsItem>> {
        let request = self
            .client
            .get(format!("{}/api/topics/show.json", self.base_url))
            .query(&[("node_name", category_or_list)]);

        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            return Err(JournalistError::Source {
                source_name: "v2ex",
                message: format!("status {} for node {}", response.status(), category_or_list),
            });
        }

        let topics: Vec<Topic> = response.json().await?;
        let fetched_at = Utc::now();
        let mut items: Vec<NewsItem> = topics
            .into_iter()
            .map(|topic| {
                let mut item = self.to_news_item(topic, fetched_at);
                // Topics listed by node do not always echo it back
                if item.category.is_empty() {
                    item.category = category_or_list.to_string();
                }
                item
            })
            .collect();

        if limit > 0 {
            items.truncate(limit);
        }

        Ok(items)
    }

    async fn category_title(&self, category: &str) -> JournalistResult<Option<String>> {
        let request = self
            .client
            .get(format!("{}/api/nodes/show.json", self.base_url))
            .query(&[("name", category)]);

        let node: NodeInfo = self
            .authorized(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let title = node.title.trim();
        Ok((!title.is_empty()).then(|| title.to_string()))
    }
}
