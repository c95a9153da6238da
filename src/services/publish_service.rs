use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use quaily::{PostParams, QuailyClient};
use serde_json::Value;

use crate::config::QuailyConfig;
use crate::errors::{JournalistError, JournalistResult};
use crate::render::{parse_markdown_file, DATETIME_FORMAT};

/// Hands a written digest to an external publishing platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &Path, channel: &str) -> JournalistResult<()>;
}

pub struct PublishService {
    client: QuailyClient,
}

impl PublishService {
    pub fn new(config: &QuailyConfig) -> JournalistResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(JournalistError::Config(
                "quaily.api_key is required to publish".to_string(),
            ));
        }

        let client = QuailyClient::new(&config.base_url, &config.api_key, config.timeout)?;
        Ok(Self { client })
    }

    /// Create a post from a Markdown file and publish it
    pub async fn publish_markdown(&self, path: &Path, channel: &str) -> JournalistResult<String> {
        let params = post_params(path, channel)?;
        let post_id = self.client.create_post(channel, &params).await?;
        self.client.publish_post(channel, &post_id).await?;
        Ok(post_id)
    }

    /// Deliver a post, given its Markdown file or its slug
    pub async fn deliver(&self, path_or_slug: &str, channel: &str) -> JournalistResult<String> {
        let slug = slug_for(path_or_slug)?;
        self.client.deliver_post(channel, &slug).await?;
        Ok(slug)
    }
}

#[async_trait]
impl Publisher for PublishService {
    async fn publish(&self, path: &Path, channel: &str) -> JournalistResult<()> {
        self.publish_markdown(path, channel).await.map(|_| ())
    }
}

/// Metadata fields plus `channel_slug` and `content`, with `datetime` as RFC 3339
fn post_params(path: &Path, channel: &str) -> JournalistResult<PostParams> {
    let doc = parse_markdown_file(path)?;
    let mut params = doc.frontmatter_json()?;

    let datetime = params
        .get("datetime")
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).ok());
    if let Some(parsed) = datetime {
        params.insert("datetime".to_string(), Value::String(parsed.and_utc().to_rfc3339()));
    }

    params.insert("channel_slug".to_string(), Value::String(channel.to_string()));
    params.insert("content".to_string(), Value::String(doc.body));
    Ok(params)
}

/// An existing file yields its `slug` metadata; anything else is taken as the slug itself
fn slug_for(path_or_slug: &str) -> JournalistResult<String> {
    let path = Path::new(path_or_slug);
    if !path.is_file() {
        return Ok(path_or_slug.to_string());
    }

    let doc = parse_markdown_file(path)?;
    match doc.get("slug") {
        None => Err(JournalistError::Frontmatter(format!(
            "missing 'slug' in {}",
            path_or_slug
        ))),
        Some(value) => match value.as_str() {
            Some(slug) if !slug.is_empty() => Ok(slug.to_string()),
            _ => Err(JournalistError::Frontmatter(format!(
                "'slug' must be a non-empty string in {}",
                path_or_slug
            ))),
        },
    }
}
