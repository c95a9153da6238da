use chrono::{DateTime, Utc};

/// One rendered entry of a digest.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestEntry {
    pub title: String,
    pub url: String,
    pub category_name: String,
    pub category_url: String,
    /// Empty when no summary is available
    pub description: String,
    pub engagement_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Structured digest handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestDocument {
    pub title: String,
    pub slug: String,
    pub datetime: DateTime<Utc>,
    pub summary: String,
    pub cover_image_url: Option<String>,
    pub preface: String,
    pub postscript: String,
    pub entries: Vec<DigestEntry>,
}

/// Substitute `{.CurrentDate}` with the UTC date of `now`.
pub fn expand_vars(text: &str, now: DateTime<Utc>) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    text.replace("{.CurrentDate}", &now.format("%Y-%m-%d").to_string())
}

/// Deterministic document summary built from the first three titles
pub fn fallback_summary<'a>(titles: impl IntoIterator<Item = &'a str>) -> String {
    let titles: Vec<&str> = titles.into_iter().take(3).collect();
    if titles.is_empty() {
        return String::new();
    }
    format!("Top highlights: {}.", titles.join(", "))
}
