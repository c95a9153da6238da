use serde::{Deserialize, Serialize};

use crate::domain::NewsItem;

pub const HN_SITE_URL: &str = "https://news.ycombinator.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    V2ex,
    HackerNews,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::V2ex => "v2ex",
            SourceKind::HackerNews => "hackernews",
        }
    }

    /// The single engagement metric fed into the popularity score.
    /// Forum topics rank by replies, link-aggregator stories by points.
    pub fn ranking_count(&self, item: &NewsItem) -> i64 {
        match self {
            SourceKind::V2ex => item.engagement_count,
            SourceKind::HackerNews => item.secondary_count,
        }
    }

    /// Link to the listing page of a category, used in rendered digests
    pub fn category_url(&self, base_url: &str, category: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            SourceKind::V2ex => format!("{}/go/{}", base, category),
            SourceKind::HackerNews => {
                let page = match category.parse::<HnItemType>() {
                    Ok(HnItemType::Ask) => "ask",
                    Ok(HnItemType::Show) => "show",
                    Ok(HnItemType::Job) => "jobs",
                    _ => "news",
                };
                format!("{}/{}", base, page)
            }
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v2ex" => Ok(SourceKind::V2ex),
            "hackernews" | "hn" => Ok(SourceKind::HackerNews),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Story lists the link aggregator exposes for polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HnList {
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl HnList {
    pub fn as_str(&self) -> &'static str {
        match self {
            HnList::Top => "top",
            HnList::New => "new",
            HnList::Best => "best",
            HnList::Ask => "ask",
            HnList::Show => "show",
            HnList::Job => "job",
        }
    }

    /// Endpoint name under the API base, without the `.json` suffix
    pub fn endpoint(&self) -> &'static str {
        match self {
            HnList::Top => "topstories",
            HnList::New => "newstories",
            HnList::Best => "beststories",
            HnList::Ask => "askstories",
            HnList::Show => "showstories",
            HnList::Job => "jobstories",
        }
    }
}

impl std::str::FromStr for HnList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" | "topstories" => Ok(HnList::Top),
            "new" | "newstories" => Ok(HnList::New),
            "best" | "beststories" => Ok(HnList::Best),
            "ask" | "askstories" => Ok(HnList::Ask),
            "show" | "showstories" => Ok(HnList::Show),
            "job" | "jobs" | "jobstories" => Ok(HnList::Job),
            _ => Err(format!("Unknown Hacker News list: {}", s)),
        }
    }
}

impl std::fmt::Display for HnList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of categories a link-aggregator item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HnItemType {
    Story,
    Ask,
    Show,
    Job,
}

impl HnItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HnItemType::Story => "story",
            HnItemType::Ask => "ask",
            HnItemType::Show => "show",
            HnItemType::Job => "job",
        }
    }

    /// Derive the category from the API `type` field and the title.
    /// Plain stories titled "Ask HN:" or "Show HN:" are promoted.
    pub fn classify(raw_type: &str, title: &str) -> Self {
        match raw_type.trim().to_lowercase().as_str() {
            "job" => HnItemType::Job,
            _ => {
                let title = title.trim_start().to_lowercase();
                if title.starts_with("ask hn:") {
                    HnItemType::Ask
                } else if title.starts_with("show hn:") {
                    HnItemType::Show
                } else {
                    HnItemType::Story
                }
            }
        }
    }
}

impl std::str::FromStr for HnItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "story" => Ok(HnItemType::Story),
            "ask" => Ok(HnItemType::Ask),
            "show" => Ok(HnItemType::Show),
            "job" => Ok(HnItemType::Job),
            _ => Err(format!("Unknown Hacker News item type: {}", s)),
        }
    }
}

impl std::fmt::Display for HnItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
