use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{Frequency, HnItemType, HnList, ScoredItem, SourceKind};

/// Which candidates a channel considers, resolved once from the configured node list.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSelector {
    /// Forum nodes, both polled and used as a case-insensitive filter.
    /// An empty list keeps everything.
    Forum { nodes: Vec<String> },
    /// Link-aggregator lists to poll, and item types to keep.
    /// An empty type set keeps everything.
    LinkAggregator {
        poll_lists: BTreeSet<HnList>,
        keep_item_types: BTreeSet<HnItemType>,
    },
}

impl ChannelSelector {
    /// Resolve a raw node list for `source`. Unknown link-aggregator list tokens
    /// are returned so the caller can report them.
    pub fn resolve(source: SourceKind, nodes: &[String]) -> (Self, Vec<String>) {
        let tokens = nodes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty());

        match source {
            SourceKind::V2ex => (
                ChannelSelector::Forum {
                    nodes: tokens.map(str::to_string).collect(),
                },
                Vec::new(),
            ),
            SourceKind::HackerNews => {
                let mut poll_lists = BTreeSet::new();
                let mut keep_item_types = BTreeSet::new();
                let mut unknown = Vec::new();

                for token in tokens {
                    let as_list = token.parse::<HnList>();
                    let as_type = token.parse::<HnItemType>();
                    if let Ok(list) = as_list {
                        poll_lists.insert(list);
                    }
                    if let Ok(item_type) = as_type {
                        keep_item_types.insert(item_type);
                    }
                    if as_list.is_err() && as_type.is_err() {
                        unknown.push(token.to_string());
                    }
                }

                if poll_lists.is_empty() {
                    poll_lists.insert(HnList::Top);
                }

                (
                    ChannelSelector::LinkAggregator {
                        poll_lists,
                        keep_item_types,
                    },
                    unknown,
                )
            }
        }
    }

    /// Category names a collector should poll for this channel
    pub fn poll_categories(&self) -> Vec<String> {
        match self {
            ChannelSelector::Forum { nodes } => nodes.clone(),
            ChannelSelector::LinkAggregator { poll_lists, .. } => {
                poll_lists.iter().map(|l| l.as_str().to_string()).collect()
            }
        }
    }

    pub fn accepts(&self, category: &str) -> bool {
        match self {
            ChannelSelector::Forum { nodes } => {
                nodes.is_empty() || nodes.iter().any(|n| n.eq_ignore_ascii_case(category))
            }
            ChannelSelector::LinkAggregator {
                keep_item_types, ..
            } => {
                keep_item_types.is_empty()
                    || category
                        .parse::<HnItemType>()
                        .map(|t| keep_item_types.contains(&t))
                        .unwrap_or(false)
            }
        }
    }

    /// Keep candidates whose category passes, preserving order
    pub fn filter(&self, items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        items
            .into_iter()
            .filter(|s| self.accepts(&s.item.category))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelTemplate {
    pub title: String,
    pub preface: String,
    pub postscript: String,
    pub cover_image_url: String,
}

/// One digest output, resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub source: SourceKind,
    pub frequency: Frequency,
    pub top_n: usize,
    pub min_items: usize,
    pub output_dir: PathBuf,
    pub selector: ChannelSelector,
    /// Zero disables skip marking
    pub skip_duration: Duration,
    pub template: ChannelTemplate,
    pub language: String,
    /// Site base used for category links
    pub site_url: String,
}

impl Channel {
    pub fn new(name: String, source: SourceKind, selector: ChannelSelector) -> Self {
        Self {
            name,
            source,
            frequency: Frequency::Daily,
            top_n: 20,
            min_items: 5,
            output_dir: PathBuf::from("./out"),
            selector,
            skip_duration: Duration::from_secs(72 * 3600),
            template: ChannelTemplate::default(),
            language: "English".to_string(),
            site_url: String::new(),
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_limits(mut self, top_n: usize, min_items: usize) -> Self {
        self.top_n = top_n;
        self.min_items = min_items;
        self
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_skip_duration(mut self, skip_duration: Duration) -> Self {
        self.skip_duration = skip_duration;
        self
    }

    pub fn with_template(mut self, template: ChannelTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_language(mut self, language: String) -> Self {
        self.language = language;
        self
    }

    pub fn with_site_url(mut self, site_url: String) -> Self {
        self.site_url = site_url;
        self
    }

    /// Candidates requested from the store before filtering
    pub fn candidate_pool(&self) -> usize {
        self.top_n.saturating_mul(5).max(self.top_n)
    }

    pub fn channel_dir(&self) -> PathBuf {
        self.output_dir.join(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewsItem;
    use chrono::Utc;

    fn scored(id: &str, category: &str, score: f64) -> ScoredItem {
        ScoredItem::new(
            NewsItem::new(id.to_string(), format!("title {id}"), Utc::now())
                .with_category(category.to_string()),
            score,
        )
    }

    fn nodes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_forum_filter_keeps_matching_nodes_in_order() {
        let (selector, _) = ChannelSelector::resolve(SourceKind::V2ex, &nodes(&["crypto"]));
        let items = vec![
            scored("1", "crypto", 3.0),
            scored("2", "apple", 2.0),
            scored("3", "crypto", 1.0),
        ];

        let kept: Vec<String> = selector
            .filter(items)
            .into_iter()
            .map(|s| s.item.id)
            .collect();
        assert_eq!(kept, vec!["1", "3"]);
    }

    #[test]
    fn test_forum_filter_is_case_insensitive_and_empty_passes() {
        let (selector, _) = ChannelSelector::resolve(SourceKind::V2ex, &nodes(&["Crypto"]));
        assert!(selector.accepts("crypto"));

        let (selector, _) = ChannelSelector::resolve(SourceKind::V2ex, &[]);
        assert!(selector.accepts("anything"));
    }

    #[test]
    fn test_link_aggregator_lists_only_do_not_filter() {
        let (selector, unknown) =
            ChannelSelector::resolve(SourceKind::HackerNews, &nodes(&["top", "best"]));
        assert!(unknown.is_empty());
        assert!(selector.accepts("story"));
        assert!(selector.accepts("job"));
        assert_eq!(selector.poll_categories(), vec!["top", "best"]);
    }

    #[test]
    fn test_link_aggregator_item_types_filter() {
        let (selector, _) =
            ChannelSelector::resolve(SourceKind::HackerNews, &nodes(&["ask", "story"]));
        match &selector {
            ChannelSelector::LinkAggregator {
                poll_lists,
                keep_item_types,
            } => {
                assert!(poll_lists.contains(&HnList::Ask));
                assert_eq!(poll_lists.len(), 1);
                assert!(keep_item_types.contains(&HnItemType::Story));
                assert!(keep_item_types.contains(&HnItemType::Ask));
            }
            other => panic!("unexpected selector {other:?}"),
        }
        assert!(selector.accepts("ask"));
        assert!(selector.accepts("story"));
        assert!(!selector.accepts("show"));
    }

    #[test]
    fn test_jobs_alias_polls_job_list_without_filtering() {
        let (selector, unknown) =
            ChannelSelector::resolve(SourceKind::HackerNews, &nodes(&["jobs"]));
        assert!(unknown.is_empty());
        assert_eq!(selector.poll_categories(), vec!["job"]);
        assert!(selector.accepts("story"));
        assert!(selector.accepts("job"));
    }

    #[test]
    fn test_link_aggregator_defaults_to_top_and_reports_unknown() {
        let (selector, unknown) =
            ChannelSelector::resolve(SourceKind::HackerNews, &nodes(&["frontpage"]));
        assert_eq!(unknown, vec!["frontpage"]);
        assert_eq!(selector.poll_categories(), vec!["top"]);
    }

    #[test]
    fn test_candidate_pool_overfetches() {
        let channel = Channel::new(
            "c".to_string(),
            SourceKind::V2ex,
            ChannelSelector::Forum { nodes: vec![] },
        )
        .with_limits(4, 2);
        assert_eq!(channel.candidate_pool(), 20);
    }
}
