pub mod sqlite;
pub mod traits;

pub use sqlite::{SqliteChannelStateRepository, SqliteNewsRepository, SqliteStorage};
pub use traits::{
    ChannelStateRepository, NewsRepository, PurgeStats, StoreMaintenance, StoreStats,
};
