use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::NewsItem;
use crate::errors::{JournalistError, JournalistResult};
use crate::summarizer::{language_or_default, Summarizer};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const ITEM_TIMEOUT: Duration = Duration::from_secs(120);
const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_CONTENT_CHARS: usize = 1000;
const MAX_DOCUMENT_LINES: usize = 10;

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: String,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiSummarizer {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> JournalistResult<Self> {
        if model.trim().is_empty() {
            return Err(JournalistError::Config(
                "openai.model must be set when openai.api_key is configured".to_string(),
            ));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(&self, system: &str, user: &str, timeout: Duration) -> JournalistResult<String> {
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.4,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(JournalistError::Summarizer(format!("status {}: {}", status, body)));
        }

        let body: Resp = resp.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize_item(&self, title: &str, content: &str, language: &str) -> JournalistResult<String> {
        let content = content.trim();
        let content = if content.is_empty() { title } else { content };
        let content = truncate_chars(content, MAX_CONTENT_CHARS);

        let system = format!(
            "You are a concise newsletter editor. Write in {}. Return 1-3 sentences (30-180 words) summarizing the topic. Plain text, no links.",
            language_or_default(language)
        );
        let user = format!("Title: {}\nContent: {}", title, content);

        self.complete(&system, &user, ITEM_TIMEOUT).await.inspect_err(|e| {
            error!(error = %e, "summarize item failed");
        })
    }

    async fn summarize_document(&self, items: &[NewsItem], language: &str) -> JournalistResult<String> {
        if items.is_empty() {
            return Ok(String::new());
        }

        let mut lines = String::new();
        for item in items.iter().take(MAX_DOCUMENT_LINES) {
            writeln!(lines, "- {} ({})", item.title, item.category)?;
        }

        let system = format!(
            "You are a succinct newsletter editor. Write in {}. Always produce 3 to 5 sentences at most (90-270 words total) that summarize the overall themes. If details are limited, infer from titles. Plain text only. Never return an empty output.",
            language_or_default(language)
        );
        let user = format!(
            "Top items (title and node):\n{}\nTask: Write some sentences summarizing today's highlights. Output the summary only, plain text, no links.",
            lines
        );

        self.complete(&system, &user, DOCUMENT_TIMEOUT).await.inspect_err(|e| {
            error!(error = %e, "summarize document failed");
        })
    }
}
