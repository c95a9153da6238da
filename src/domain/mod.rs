pub mod channel;
pub mod clock;
pub mod digest;
pub mod news_item;
pub mod period;
pub mod score;
pub mod source;

pub use channel::{Channel, ChannelSelector, ChannelTemplate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{expand_vars, fallback_summary, DigestDocument, DigestEntry};
pub use news_item::{NewsItem, ScoredItem};
pub use period::Frequency;
pub use score::popularity_score;
pub use source::{HnItemType, HnList, SourceKind, HN_SITE_URL};
