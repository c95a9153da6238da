use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalistError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid duration for {field}: {value:?}")]
    InvalidDuration { field: String, value: String },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Source {source_name} failed: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    #[error("Summarizer failed: {0}")]
    Summarizer(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Output errors
    #[error("Render failed: {0}")]
    Render(String),

    #[error("Frontmatter error: {0}")]
    Frontmatter(String),

    #[error("Not enough items: {available} available, {required} required")]
    NotEnoughItems { available: usize, required: usize },

    // Publishing errors from the quaily library
    #[error("Publish failed: {0}")]
    Publish(String),

    // Supervision errors
    #[error("Worker {name} failed: {message}")]
    Worker { name: String, message: String },

    #[error("Blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<quaily::QuailyError> for JournalistError {
    fn from(err: quaily::QuailyError) -> Self {
        JournalistError::Publish(err.to_string())
    }
}

impl From<std::fmt::Error> for JournalistError {
    fn from(err: std::fmt::Error) -> Self {
        JournalistError::Render(err.to_string())
    }
}

pub type JournalistResult<T> = Result<T, JournalistError>;
