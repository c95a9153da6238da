mod channel_state_repository;
mod connection;
mod news_repository;

pub use channel_state_repository::SqliteChannelStateRepository;
pub use connection::SqliteStorage;
pub use news_repository::SqliteNewsRepository;
