use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    expand_vars, fallback_summary, Channel, DigestDocument, DigestEntry, NewsItem, ScoredItem,
    SourceKind,
};
use crate::errors::{JournalistError, JournalistResult};
use crate::render::render_digest;
use crate::services::publish_service::Publisher;
use crate::services::run_blocking;
use crate::storage::traits::{ChannelStateRepository, NewsRepository};
use crate::summarizer::Summarizer;

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    AlreadyPublished { period: String },
    NotEnoughItems { available: usize, required: usize },
    Written {
        path: PathBuf,
        items: usize,
        /// False when another builder claimed the period first
        claimed: bool,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceOptions {
    /// Leave out items with an active skip marker
    pub respect_skips: bool,
    /// Publish the written file when a publisher is configured
    pub publish: bool,
}

/// Selects, renders and records the digest of one channel.
pub struct DigestService<N: NewsRepository, S: ChannelStateRepository> {
    channel: Channel,
    news: Arc<N>,
    state: Arc<S>,
    summarizer: Option<Arc<dyn Summarizer>>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl<N, S> DigestService<N, S>
where
    N: NewsRepository + 'static,
    S: ChannelStateRepository + 'static,
{
    pub fn new(channel: Channel, news: N, state: S) -> Self {
        Self {
            channel,
            news: Arc::new(news),
            state: Arc::new(state),
            summarizer: None,
            publisher: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_publisher(mut self, publisher: Option<Arc<dyn Publisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// One scheduled pass: at most one digest per channel and period
    pub async fn build_once(&self, now: DateTime<Utc>) -> JournalistResult<BuildOutcome> {
        let channel = &self.channel.name;
        let period = self.channel.frequency.period_key(now);

        if self.is_published(&period).await? {
            debug!(channel = %channel, period = %period, "already published");
            return Ok(BuildOutcome::AlreadyPublished { period });
        }

        let candidates = self.select_candidates(&period, true).await?;
        if candidates.len() < self.channel.min_items {
            info!(
                channel = %channel,
                period = %period,
                available = candidates.len(),
                required = self.channel.min_items,
                "not enough items"
            );
            return Ok(BuildOutcome::NotEnoughItems {
                available: candidates.len(),
                required: self.channel.min_items,
            });
        }

        let selected = self.truncate(candidates);
        let path = self.write(&selected, now).await?;

        let claimed = self.mark_published(&period).await?;
        if claimed {
            self.mark_skipped(&selected).await?;
        } else {
            warn!(channel = %channel, period = %period, "period was claimed concurrently, leaving skip markers alone");
        }

        info!(channel = %channel, period = %period, path = %path.display(), items = selected.len(), "digest written");

        if claimed {
            self.publish_best_effort(&path).await;
        }

        Ok(BuildOutcome::Written {
            path,
            items: selected.len(),
            claimed,
        })
    }

    /// Manual generation: ignores the published flag and never records state
    pub async fn generate(&self, now: DateTime<Utc>, options: ForceOptions) -> JournalistResult<PathBuf> {
        let period = self.channel.frequency.period_key(now);
        let candidates = self.select_candidates(&period, options.respect_skips).await?;

        if candidates.len() < self.channel.min_items {
            return Err(JournalistError::NotEnoughItems {
                available: candidates.len(),
                required: self.channel.min_items,
            });
        }

        let selected = self.truncate(candidates);
        let path = self.write(&selected, now).await?;

        if options.publish {
            match &self.publisher {
                Some(publisher) => publisher.publish(&path, &self.channel.name).await?,
                None => {
                    return Err(JournalistError::Config(
                        "publishing requested but quaily is not configured".to_string(),
                    ))
                }
            }
        }

        Ok(path)
    }

    /// Ranked candidates for `period` after category, zero-signal and skip filtering
    pub async fn select_candidates(
        &self,
        period: &str,
        respect_skips: bool,
    ) -> JournalistResult<Vec<ScoredItem>> {
        let source = self.channel.source;
        let pool = self.channel.candidate_pool();

        let items = {
            let period = period.to_string();
            run_blocking(&self.news, move |news| news.top_items(source, &period, pool)).await?
        };
        let items = self.channel.selector.filter(items);
        let items: Vec<ScoredItem> = items
            .into_iter()
            .filter(|s| has_signal(source, s))
            .collect();

        if !respect_skips {
            return Ok(items);
        }

        let channel = self.channel.name.clone();
        run_blocking(&self.state, move |state| {
            let mut kept = Vec::with_capacity(items.len());
            for scored in items {
                match state.is_skipped(&channel, &scored.item.id) {
                    Ok(false) => kept.push(scored),
                    Ok(true) => {}
                    Err(e) => {
                        warn!(channel = %channel, item_id = %scored.item.id, error = %e, "skip check failed, dropping item");
                    }
                }
            }
            Ok(kept)
        })
        .await
    }

    async fn is_published(&self, period: &str) -> JournalistResult<bool> {
        let channel = self.channel.name.clone();
        let period = period.to_string();
        run_blocking(&self.state, move |state| state.is_published(&channel, &period)).await
    }

    async fn mark_published(&self, period: &str) -> JournalistResult<bool> {
        let channel = self.channel.name.clone();
        let period = period.to_string();
        run_blocking(&self.state, move |state| state.mark_published(&channel, &period)).await
    }

    /// Individual marker failures are logged and do not abort the pass
    async fn mark_skipped(&self, selected: &[ScoredItem]) -> JournalistResult<()> {
        let channel = self.channel.name.clone();
        let duration = self.channel.skip_duration;
        let ids: Vec<String> = selected.iter().map(|s| s.item.id.clone()).collect();

        run_blocking(&self.state, move |state| {
            for id in &ids {
                if let Err(e) = state.mark_skipped(&channel, id, duration) {
                    warn!(channel = %channel, item_id = %id, error = %e, "mark skipped failed");
                }
            }
            Ok(())
        })
        .await
    }

    fn truncate(&self, mut items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        items.truncate(self.channel.top_n);
        items
    }

    /// Build the structured digest for the selected items
    pub async fn compose(&self, selected: &[ScoredItem], now: DateTime<Utc>) -> DigestDocument {
        let titles = self.category_titles(selected).await;
        let language = &self.channel.language;

        let mut entries = Vec::with_capacity(selected.len());
        for scored in selected {
            let item = &scored.item;
            let description = match &self.summarizer {
                Some(summarizer) => summarizer
                    .summarize_item(&item.title, &item.content, language)
                    .await
                    .unwrap_or_default(),
                None => String::new(),
            };

            entries.push(DigestEntry {
                title: item.title.clone(),
                url: item.url.clone(),
                category_name: titles
                    .get(&item.category)
                    .cloned()
                    .unwrap_or_else(|| item.category.clone()),
                category_url: self
                    .channel
                    .source
                    .category_url(&self.channel.site_url, &item.category),
                description,
                engagement_count: item.engagement_count,
                created_at: item.created_at,
            });
        }

        let items: Vec<NewsItem> = selected.iter().map(|s| s.item.clone()).collect();
        let mut summary = match &self.summarizer {
            Some(summarizer) => summarizer
                .summarize_document(&items, language)
                .await
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        };
        if summary.is_empty() {
            summary = fallback_summary(items.iter().map(|i| i.title.as_str()));
        }

        let template = &self.channel.template;
        let title = match expand_vars(template.title.trim(), now) {
            t if t.is_empty() => format!("Digest of {} {}", self.channel.name, now.format("%Y-%m-%d")),
            t => t,
        };
        let cover_image_url = Some(expand_vars(template.cover_image_url.trim(), now))
            .filter(|u| !u.is_empty());

        DigestDocument {
            title,
            slug: self.slug(now),
            datetime: now,
            summary,
            cover_image_url,
            preface: expand_vars(&template.preface, now),
            postscript: expand_vars(&template.postscript, now),
            entries,
        }
    }

    /// Output path for `now`, stable across re-runs on the same day
    pub fn output_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.channel
            .channel_dir()
            .join(self.channel.frequency.file_name(now))
    }

    fn slug(&self, now: DateTime<Utc>) -> String {
        self.channel
            .frequency
            .file_name(now)
            .trim_end_matches(".md")
            .to_string()
    }

    async fn category_titles(&self, selected: &[ScoredItem]) -> HashMap<String, String> {
        let source = self.channel.source;
        let categories: BTreeSet<String> = selected.iter().map(|s| s.item.category.clone()).collect();

        let lookup = run_blocking(&self.news, move |news| {
            let mut titles = HashMap::new();
            for category in categories {
                match news.category_title(source, &category) {
                    Ok(Some(title)) => {
                        titles.insert(category, title);
                    }
                    Ok(None) => {}
                    Err(e) => debug!(category = %category, error = %e, "category title lookup failed"),
                }
            }
            Ok(titles)
        })
        .await;

        lookup.unwrap_or_else(|e| {
            debug!(error = %e, "category title lookup failed");
            HashMap::new()
        })
    }

    async fn write(&self, selected: &[ScoredItem], now: DateTime<Utc>) -> JournalistResult<PathBuf> {
        let document = self.compose(selected, now).await;
        let text = render_digest(&document)?;

        let path = self.output_path(now);
        tokio::fs::create_dir_all(self.channel.channel_dir()).await?;
        tokio::fs::write(&path, text).await?;
        Ok(path)
    }

    async fn publish_best_effort(&self, path: &std::path::Path) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let channel = &self.channel.name;
        match tokio::time::timeout(PUBLISH_TIMEOUT, publisher.publish(path, channel)).await {
            Ok(Ok(())) => info!(channel = %channel, path = %path.display(), "published"),
            Ok(Err(e)) => warn!(channel = %channel, error = %e, "publish failed"),
            Err(_) => warn!(channel = %channel, "publish timed out"),
        }
    }
}

/// Zero-score items never qualify; forum topics also need at least one reply
fn has_signal(source: SourceKind, scored: &ScoredItem) -> bool {
    if scored.score <= 0.0 {
        return false;
    }
    match source {
        SourceKind::V2ex => scored.item.engagement_count > 0,
        SourceKind::HackerNews => true,
    }
}
