use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{HnItemType, HnList, NewsItem, SourceKind, HN_SITE_URL};
use crate::errors::{JournalistError, JournalistResult};
use crate::sources::created_at_or;
use crate::sources::html::html_to_text;
use crate::sources::traits::NewsSource;

pub const DEFAULT_BASE_API: &str = "https://hacker-news.firebaseio.com/v0";

const ITEM_CONCURRENCY: usize = 8;
const ITEM_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    descendants: i64,
    #[serde(default)]
    kids: Vec<u64>,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    dead: bool,
}

impl HnItem {
    fn into_news_item(self, fetched_at: DateTime<Utc>) -> NewsItem {
        let category = HnItemType::classify(&self.kind, &self.title);
        let replies = self.descendants.max(self.kids.len() as i64);
        let url = if self.url.trim().is_empty() {
            format!("{}/item?id={}", HN_SITE_URL, self.id)
        } else {
            self.url
        };
        let created_at = created_at_or(self.time, fetched_at, self.id);

        NewsItem::new(self.id.to_string(), self.title, created_at)
            .with_url(url)
            .with_category(category.as_str().to_string())
            .with_counts(replies, self.score)
            .with_content(html_to_text(&self.text))
    }
}

pub struct HackerNewsSource {
    client: Client,
    base_api: String,
}

impl HackerNewsSource {
    pub fn new(base_api: &str) -> JournalistResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let base_api = if base_api.trim().is_empty() {
            DEFAULT_BASE_API
        } else {
            base_api
        };

        Ok(Self {
            client,
            base_api: base_api.trim_end_matches('/').to_string(),
        })
    }

    async fn story_ids(&self, list: HnList) -> JournalistResult<Vec<u64>> {
        let response = self
            .client
            .get(format!("{}/{}.json", self.base_api, list.endpoint()))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn item(&self, id: u64) -> JournalistResult<Option<HnItem>> {
        let request = async {
            let response = self
                .client
                .get(format!("{}/item/{}.json", self.base_api, id))
                .send()
                .await?
                .error_for_status()?;
            // Deleted items come back as a JSON null
            Ok::<_, JournalistError>(response.json::<Option<HnItem>>().await?)
        };

        match tokio::time::timeout(ITEM_TIMEOUT, request).await {
            Ok(result) => result,
            Err(_) => Err(JournalistError::Source {
                source_name: "hackernews",
                message: format!("item {} timed out", id),
            }),
        }
    }
}

#[async_trait]
impl NewsSource for HackerNewsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HackerNews
    }

    async fn fetch(&self, category_or_list: &str, limit: usize) -> JournalistResult<Vec<NewsItem>> {
        let list = category_or_list.parse::<HnList>().unwrap_or_else(|_| {
            warn!(list = %category_or_list, "unknown Hacker News list, polling top");
            HnList::Top
        });

        let mut ids = self.story_ids(list).await?;
        if limit > 0 {
            ids.truncate(limit);
        }

        let fetched_at = Utc::now();
        let items: Vec<NewsItem> = stream::iter(ids)
            .map(|id| async move { (id, self.item(id).await) })
            .buffered(ITEM_CONCURRENCY)
            .filter_map(|(id, result)| async move {
                match result {
                    Ok(Some(item)) if !item.deleted && !item.dead && !item.title.is_empty() => {
                        Some(item.into_news_item(fetched_at))
                    }
                    Ok(_) => None,
                    Err(e) => {
                        debug!(item_id = id, error = %e, "skipping Hacker News item");
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_item(server: &MockServer, id: u64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/item/{id}.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_item_mapping() {
        let raw: HnItem = serde_json::from_value(json!({
            "id": 7,
            "type": "story",
            "title": "Show HN: A tiny database",
            "text": "<p>Built with <b>Rust</b></p>",
            "score": 120,
            "descendants": 2,
            "kids": [1, 2, 3],
            "time": 1714557600
        }))
        .unwrap();

        let item = raw.into_news_item(Utc::now());
        assert_eq!(item.id, "7");
        assert_eq!(item.category, "show");
        assert_eq!(item.engagement_count, 3);
        assert_eq!(item.secondary_count, 120);
        assert_eq!(item.url, "https://news.ycombinator.com/item?id=7");
        assert_eq!(item.content, "Built with Rust");
        assert_eq!(item.created_at.timestamp(), 1714557600);
    }

    #[test]
    fn test_item_without_time_uses_fetch_time() {
        let raw: HnItem = serde_json::from_value(json!({
            "id": 8,
            "type": "story",
            "title": "Undated",
            "score": 10
        }))
        .unwrap();

        let fetched = DateTime::<Utc>::from_timestamp(1714564800, 0).unwrap();
        assert_eq!(raw.into_news_item(fetched).created_at, fetched);
    }

    #[tokio::test]
    async fn test_fetch_resolves_items_in_list_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/askstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([3, 1, 2])))
            .mount(&server)
            .await;
        mount_item(&server, 3, json!({"id": 3, "type": "story", "title": "Ask HN: three", "score": 5, "time": 1})).await;
        mount_item(&server, 1, json!({"id": 1, "type": "story", "title": "one", "url": "https://a.example", "score": 9, "time": 1})).await;
        mount_item(&server, 2, json!({"id": 2, "type": "job", "title": "two", "score": 1, "time": 1})).await;

        let source = HackerNewsSource::new(&server.uri()).unwrap();
        let items = source.fetch("ask", 2).await.unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(items[0].category, "ask");
        assert_eq!(items[1].url, "https://a.example");
    }

    #[tokio::test]
    async fn test_fetch_skips_null_and_failed_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;
        mount_item(&server, 1, json!(null)).await;
        Mock::given(method("GET"))
            .and(path("/item/2.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_item(&server, 3, json!({"id": 3, "type": "story", "title": "ok", "score": 3, "time": 1})).await;

        let source = HackerNewsSource::new(&server.uri()).unwrap();
        let items = source.fetch("frontpage", 0).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "3");
    }

    #[tokio::test]
    async fn test_fetch_list_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/newstories.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HackerNewsSource::new(&server.uri()).unwrap();
        assert!(source.fetch("new", 10).await.is_err());
    }
}
