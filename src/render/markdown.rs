use std::fmt::Write as _;

use serde::Serialize;

use crate::domain::DigestDocument;
use crate::errors::JournalistResult;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    slug: &'a str,
    datetime: String,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image_url: Option<&'a str>,
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Render a digest as Markdown with a YAML metadata block
pub fn render_digest(doc: &DigestDocument) -> JournalistResult<String> {
    let frontmatter = Frontmatter {
        title: &doc.title,
        slug: &doc.slug,
        datetime: doc.datetime.format(DATETIME_FORMAT).to_string(),
        summary: &doc.summary,
        cover_image_url: doc.cover_image_url.as_deref().filter(|u| !u.trim().is_empty()),
    };

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&serde_yaml::to_string(&frontmatter)?);
    out.push_str("---\n\n");

    if !doc.preface.trim().is_empty() {
        writeln!(out, "{}\n", doc.preface.trim())?;
    }

    for entry in &doc.entries {
        writeln!(out, "### [{}]({})\n", escape_link_text(&entry.title), entry.url)?;
        if entry.category_url.is_empty() {
            writeln!(out, "- Category: {}", entry.category_name)?;
        } else {
            writeln!(
                out,
                "- Category: [{}]({})",
                escape_link_text(&entry.category_name),
                entry.category_url
            )?;
        }
        writeln!(out, "- Replies: {}", entry.engagement_count)?;
        writeln!(out, "- Created: {} UTC\n", entry.created_at.format(DATETIME_FORMAT))?;

        if !entry.description.trim().is_empty() {
            writeln!(out, "{}\n", entry.description.trim())?;
        }
    }

    if !doc.postscript.trim().is_empty() {
        writeln!(out, "---\n\n{}", doc.postscript.trim())?;
    }

    Ok(out)
}
