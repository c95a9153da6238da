pub mod openai;

use async_trait::async_trait;

use crate::domain::NewsItem;
use crate::errors::JournalistResult;

pub use openai::OpenAiSummarizer;

/// Optional text summarization used to decorate digests.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// A short description of one item
    async fn summarize_item(&self, title: &str, content: &str, language: &str) -> JournalistResult<String>;

    /// An overall summary of the selected items
    async fn summarize_document(&self, items: &[NewsItem], language: &str) -> JournalistResult<String>;
}

pub(crate) fn language_or_default(language: &str) -> &str {
    let language = language.trim();
    if language.is_empty() {
        "English"
    } else {
        language
    }
}
