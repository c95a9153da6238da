pub mod duration;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::domain::{Channel, ChannelSelector, ChannelTemplate, Frequency, SourceKind, HN_SITE_URL};
use crate::errors::{JournalistError, JournalistResult};
use crate::sources::hackernews::DEFAULT_BASE_API;

pub use duration::{parse_duration, parse_duration_or};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DB_PATH: &str = "./journalist.db";
const DEFAULT_V2EX_URL: &str = "https://www.v2ex.com";
const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_LIMIT_PER_LIST: usize = 64;
const DEFAULT_TOP_N: usize = 20;
const DEFAULT_MIN_ITEMS: usize = 5;
const DEFAULT_OUTPUT_DIR: &str = "./out";
const DEFAULT_BUILD_INTERVAL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_SKIP_DURATION: Duration = Duration::from_secs(72 * 3600);
const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_QUAILY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(3600);

// File layout, before defaults and validation

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    app: FileApp,
    storage: FileStorage,
    sources: FileSources,
    openai: FileOpenAi,
    newsletters: FileNewsletters,
    quaily: FileQuaily,
    janitor: FileJanitor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileApp {
    log_level: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileStorage {
    path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSources {
    v2ex: FileV2ex,
    hackernews: FileHackerNews,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileV2ex {
    token: String,
    base_url: String,
    fetch_interval: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileHackerNews {
    base_api: String,
    fetch_interval: String,
    limit_per_list: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileOpenAi {
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileNewsletters {
    frequency: String,
    top_n: i64,
    min_items: i64,
    output_dir: String,
    build_interval: String,
    channels: Vec<FileChannel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileTemplate {
    title: String,
    preface: String,
    postscript: String,
    cover_image_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileChannel {
    name: String,
    source: String,
    frequency: String,
    top_n: i64,
    min_items: i64,
    output_dir: String,
    nodes: Vec<String>,
    item_skip_duration: String,
    template: FileTemplate,
    language: String,
    // Older configs put these at the channel level
    preface: String,
    postscript: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileQuaily {
    base_url: String,
    api_key: String,
    timeout: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileJanitor {
    interval: String,
    ranked_retention: String,
}

// Resolved settings

#[derive(Debug, Clone)]
pub struct V2exConfig {
    pub base_url: String,
    pub token: String,
    pub fetch_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct HackerNewsConfig {
    pub base_api: String,
    pub fetch_interval: Duration,
    pub limit_per_list: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct QuailyConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl QuailyConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct JanitorConfig {
    pub interval: Duration,
    /// Zero keeps ranked entries until their payloads are purged
    pub ranked_retention: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub v2ex: V2exConfig,
    pub hackernews: HackerNewsConfig,
    pub openai: OpenAiConfig,
    pub quaily: QuailyConfig,
    pub build_interval: Duration,
    pub janitor: JanitorConfig,
    pub channels: Vec<Channel>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Load `.env` from the executable's directory, then the current one
    pub fn load_dotenv() {
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        dotenvy::dotenv().ok();
    }

    /// Read a YAML file and apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> JournalistResult<Self> {
        let path = path.as_ref();
        Self::load_dotenv();

        let text = std::fs::read_to_string(path).map_err(|e| {
            JournalistError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml(&text)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse, default and validate a YAML document
    pub fn from_yaml(text: &str) -> JournalistResult<Self> {
        let file: FileConfig = if text.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };

        let v2ex = V2exConfig {
            base_url: url_or_default("sources.v2ex.base_url", &file.sources.v2ex.base_url, DEFAULT_V2EX_URL)?,
            token: file.sources.v2ex.token.trim().to_string(),
            fetch_interval: interval_or(
                "sources.v2ex.fetch_interval",
                &file.sources.v2ex.fetch_interval,
                DEFAULT_FETCH_INTERVAL,
            )?,
        };

        let hackernews = HackerNewsConfig {
            base_api: url_or_default(
                "sources.hackernews.base_api",
                &file.sources.hackernews.base_api,
                DEFAULT_BASE_API,
            )?,
            fetch_interval: interval_or(
                "sources.hackernews.fetch_interval",
                &file.sources.hackernews.fetch_interval,
                DEFAULT_FETCH_INTERVAL,
            )?,
            limit_per_list: positive_or_default(
                "sources.hackernews.limit_per_list",
                file.sources.hackernews.limit_per_list,
                DEFAULT_LIMIT_PER_LIST,
            )?,
        };

        let openai = OpenAiConfig {
            api_key: file.openai.api_key.trim().to_string(),
            model: file.openai.model.trim().to_string(),
            base_url: file.openai.base_url.trim().to_string(),
        };

        let quaily = QuailyConfig {
            base_url: url_or_default("quaily.base_url", &file.quaily.base_url, quaily::DEFAULT_BASE_URL)?,
            api_key: file.quaily.api_key.trim().to_string(),
            timeout: parse_duration_or("quaily.timeout", &file.quaily.timeout, DEFAULT_QUAILY_TIMEOUT)?,
        };

        let janitor = JanitorConfig {
            interval: interval_or("janitor.interval", &file.janitor.interval, DEFAULT_JANITOR_INTERVAL)?,
            ranked_retention: parse_duration_or(
                "janitor.ranked_retention",
                &file.janitor.ranked_retention,
                Duration::ZERO,
            )?,
        };

        let build_interval = interval_or(
            "newsletters.build_interval",
            &file.newsletters.build_interval,
            DEFAULT_BUILD_INTERVAL,
        )?;

        let channels = resolve_channels(&file.newsletters, &v2ex)?;

        Ok(Self {
            log_level: or_default(&file.app.log_level, DEFAULT_LOG_LEVEL),
            db_path: or_default(&file.storage.path, DEFAULT_DB_PATH),
            v2ex,
            hackernews,
            openai,
            quaily,
            build_interval,
            janitor,
            channels,
        })
    }

    /// Secrets from the environment fill blanks; the database path is always overridable
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if self.v2ex.token.is_empty() {
            if let Some(token) = value("V2EX_TOKEN") {
                self.v2ex.token = token;
            }
        }
        if self.openai.api_key.is_empty() {
            if let Some(key) = value("OPENAI_API_KEY") {
                self.openai.api_key = key;
            }
        }
        if self.quaily.api_key.is_empty() {
            if let Some(key) = value("QUAILY_API_KEY") {
                self.quaily.api_key = key;
            }
        }
        if let Some(path) = value("JOURNALIST_DB_PATH") {
            self.db_path = path;
        }
    }

    pub fn channel(&self, name: &str) -> JournalistResult<&Channel> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| JournalistError::ChannelNotFound(name.to_string()))
    }

    pub fn channels_for(&self, source: SourceKind) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(move |c| c.source == source)
    }

    /// Union of categories polled for `source` across its channels, sorted
    pub fn poll_categories(&self, source: SourceKind) -> Vec<String> {
        let categories: BTreeSet<String> = self
            .channels_for(source)
            .flat_map(|c| c.selector.poll_categories())
            .collect();
        categories.into_iter().collect()
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Blank takes `default`; anything else must be an absolute http(s) URL
fn url_or_default(field: &str, value: &str, default: &str) -> JournalistResult<String> {
    let value = or_default(value, default);
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(JournalistError::Config(format!("{field} is not a valid URL: {value}"))),
    }
}

/// Loop intervals cannot be disabled
fn interval_or(field: &str, value: &str, default: Duration) -> JournalistResult<Duration> {
    let interval = parse_duration_or(field, value, default)?;
    if interval.is_zero() {
        return Err(JournalistError::Config(format!("{field} must be positive")));
    }
    Ok(interval)
}

/// Zero means "use the default"; negatives are rejected
fn positive_or_default(field: &str, value: i64, default: usize) -> JournalistResult<usize> {
    match value {
        0 => Ok(default),
        v if v < 0 => Err(JournalistError::Config(format!("{field} must be positive, got {v}"))),
        v => usize::try_from(v).map_err(|_| JournalistError::Config(format!("{field} is too large"))),
    }
}

fn resolve_channels(newsletters: &FileNewsletters, v2ex: &V2exConfig) -> JournalistResult<Vec<Channel>> {
    let default_frequency = or_default(&newsletters.frequency, Frequency::Daily.as_str());
    let default_top_n = positive_or_default("newsletters.top_n", newsletters.top_n, DEFAULT_TOP_N)?;
    let default_min_items =
        positive_or_default("newsletters.min_items", newsletters.min_items, DEFAULT_MIN_ITEMS)?;
    let default_output_dir = or_default(&newsletters.output_dir, DEFAULT_OUTPUT_DIR);

    let mut seen = HashSet::new();
    let mut channels = Vec::with_capacity(newsletters.channels.len());

    for raw in &newsletters.channels {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(JournalistError::Config("channel name must not be empty".to_string()));
        }
        if !seen.insert(name.clone()) {
            return Err(JournalistError::Config(format!("duplicate channel name: {name}")));
        }

        let source: SourceKind = raw
            .source
            .parse()
            .map_err(|e| JournalistError::Config(format!("channel {name}: {e}")))?;

        let frequency: Frequency = or_default(&raw.frequency, &default_frequency)
            .parse()
            .map_err(|e| JournalistError::Config(format!("channel {name}: {e}")))?;

        let top_n = positive_or_default(&format!("channel {name} top_n"), raw.top_n, default_top_n)?;
        let min_items =
            positive_or_default(&format!("channel {name} min_items"), raw.min_items, default_min_items)?;

        let skip_duration = parse_duration_or(
            &format!("newsletters.channels.{name}.item_skip_duration"),
            &raw.item_skip_duration,
            DEFAULT_SKIP_DURATION,
        )?;

        let (selector, unknown) = ChannelSelector::resolve(source, &raw.nodes);
        if !unknown.is_empty() {
            warn!(channel = %name, nodes = ?unknown, "ignoring unknown Hacker News nodes");
        }

        let mut template = ChannelTemplate {
            title: raw.template.title.clone(),
            preface: raw.template.preface.clone(),
            postscript: raw.template.postscript.clone(),
            cover_image_url: raw.template.cover_image_url.clone(),
        };
        if template.preface.is_empty() && !raw.preface.is_empty() {
            template.preface = raw.preface.clone();
        }
        if template.postscript.is_empty() && !raw.postscript.is_empty() {
            template.postscript = raw.postscript.clone();
        }

        let site_url = match source {
            SourceKind::V2ex => v2ex.base_url.clone(),
            SourceKind::HackerNews => HN_SITE_URL.to_string(),
        };

        channels.push(
            Channel::new(name, source, selector)
                .with_frequency(frequency)
                .with_limits(top_n, min_items)
                .with_output_dir(PathBuf::from(or_default(&raw.output_dir, &default_output_dir)))
                .with_skip_duration(skip_duration)
                .with_template(template)
                .with_language(or_default(&raw.language, DEFAULT_LANGUAGE))
                .with_site_url(site_url),
        );
    }

    Ok(channels)
}
