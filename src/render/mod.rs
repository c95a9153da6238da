pub mod frontmatter;
pub mod markdown;

pub use frontmatter::{parse_markdown, parse_markdown_file, MarkdownDocument};
pub use markdown::{render_digest, DATETIME_FORMAT};
