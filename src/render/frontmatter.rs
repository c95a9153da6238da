use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::errors::{JournalistError, JournalistResult};

/// A Markdown file split into its YAML metadata block and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownDocument {
    pub frontmatter: Mapping,
    pub body: String,
}

impl MarkdownDocument {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.frontmatter.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> Vec<String> {
        self.frontmatter
            .keys()
            .map(|k| match k.as_str() {
                Some(s) => s.to_string(),
                None => format!("{:?}", k),
            })
            .collect()
    }

    /// Metadata as JSON object fields
    pub fn frontmatter_json(&self) -> JournalistResult<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(&self.frontmatter)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(JournalistError::Frontmatter(
                "metadata is not a mapping".to_string(),
            )),
        }
    }
}

/// Split `text` into metadata and body. Text that does not open with a
/// `---` line has no metadata.
pub fn parse_markdown(text: &str) -> JournalistResult<MarkdownDocument> {
    if !text.starts_with("---") {
        return Ok(MarkdownDocument {
            frontmatter: Mapping::new(),
            body: text.to_string(),
        });
    }

    let mut lines = text.split_inclusive('\n');
    let mut consumed = lines.next().map(str::len).unwrap_or(0);
    let mut yaml = String::new();

    for line in lines {
        consumed += line.len();
        if line.trim() == "---" {
            break;
        }
        yaml.push_str(line);
    }

    let body = text.get(consumed..).unwrap_or_default().to_string();

    let frontmatter = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(&yaml)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => {
                return Err(JournalistError::Frontmatter(format!(
                    "expected a mapping, found {:?}",
                    other
                )))
            }
        }
    };

    Ok(MarkdownDocument { frontmatter, body })
}

pub fn parse_markdown_file<P: AsRef<Path>>(path: P) -> JournalistResult<MarkdownDocument> {
    let text = std::fs::read_to_string(path)?;
    parse_markdown(&text)
}
