//! Quaily publishing bindings for Rust
//! Provides functions to create, publish and deliver posts in a Quaily list

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.quaily.com/v1";

#[derive(Error, Debug)]
pub enum QuailyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("{operation} failed: status={status} body={body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("Create post response is missing an id")]
    MissingPostId,
    #[error("Empty {0}")]
    EmptyArgument(&'static str),
}

/// Post fields sent to the create endpoint. Keys follow the Quaily API.
pub type PostParams = Map<String, Value>;

pub struct QuailyClient {
    url: String,
    client: Client,
}

impl QuailyClient {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, QuailyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| QuailyError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = if timeout.is_zero() {
            Duration::from_secs(10)
        } else {
            timeout
        };

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a post in a list and return its id
    pub async fn create_post(
        &self,
        channel_slug: &str,
        params: &PostParams,
    ) -> Result<String, QuailyError> {
        let response = self
            .client
            .post(format!("{}/lists/{}/posts", self.url, channel_slug))
            .json(params)
            .send()
            .await?;

        let response = check_status("create post", response).await?;
        let body: Value = response.json().await?;
        extract_post_id(&body).ok_or(QuailyError::MissingPostId)
    }

    /// Publish a previously created post by id
    pub async fn publish_post(&self, channel_slug: &str, post_id: &str) -> Result<(), QuailyError> {
        if post_id.trim().is_empty() {
            return Err(QuailyError::EmptyArgument("post id"));
        }

        let response = self
            .client
            .put(format!(
                "{}/lists/{}/posts/{}/publish",
                self.url, channel_slug, post_id
            ))
            .send()
            .await?;

        check_status("publish post", response).await?;
        Ok(())
    }

    /// Deliver (email) a published post by slug
    pub async fn deliver_post(&self, channel_slug: &str, post_slug: &str) -> Result<(), QuailyError> {
        if post_slug.trim().is_empty() {
            return Err(QuailyError::EmptyArgument("post slug"));
        }

        let response = self
            .client
            .put(format!(
                "{}/lists/{}/posts/{}/deliver",
                self.url, channel_slug, post_slug
            ))
            .send()
            .await?;

        check_status("deliver post", response).await?;
        Ok(())
    }
}

async fn check_status(operation: &'static str, response: Response) -> Result<Response, QuailyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(QuailyError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// The API has returned the id both at the top level and nested under `data`,
/// as a string or as a number.
fn extract_post_id(body: &Value) -> Option<String> {
    fn id_of(value: &Value) -> Option<String> {
        match value.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    id_of(body).or_else(|| body.get("data").and_then(id_of))
}

/// Create a new Quaily client
pub fn create_client(url: &str, api_key: &str, timeout: Duration) -> Result<QuailyClient, QuailyError> {
    QuailyClient::new(url, api_key, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> QuailyClient {
        QuailyClient::new(&server.uri(), "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_post_id_variants() {
        assert_eq!(extract_post_id(&json!({"id": "abc"})), Some("abc".to_string()));
        assert_eq!(extract_post_id(&json!({"id": 42})), Some("42".to_string()));
        assert_eq!(
            extract_post_id(&json!({"data": {"id": "nested"}})),
            Some("nested".to_string())
        );
        assert_eq!(extract_post_id(&json!({"id": ""})), None);
        assert_eq!(extract_post_id(&json!({"ok": true})), None);
    }

    #[tokio::test]
    async fn test_create_post_sends_params_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/daily/posts"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"slug": "daily-20240501"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 7}})))
            .expect(1)
            .mount(&server)
            .await;

        let mut params = PostParams::new();
        params.insert("slug".to_string(), json!("daily-20240501"));

        let id = client_for(&server).create_post("daily", &params).await.unwrap();
        assert_eq!(id, "7");
    }

    #[tokio::test]
    async fn test_publish_post_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/lists/daily/posts/7/publish"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client_for(&server).publish_post("daily", "7").await.unwrap_err();
        match err {
            QuailyError::Status { status, body, .. } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_deliver_post_rejects_empty_slug() {
        let server = MockServer::start().await;
        let err = client_for(&server).deliver_post("daily", "  ").await.unwrap_err();
        assert!(matches!(err, QuailyError::EmptyArgument("post slug")));
    }

    #[tokio::test]
    async fn test_deliver_post_hits_slug_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/lists/daily/posts/daily-20240501/deliver"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .deliver_post("daily", "daily-20240501")
            .await
            .unwrap();
    }
}
