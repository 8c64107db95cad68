use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopularReposError {
    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("List view error: {0}")]
    ViewError(String),
}

pub type Result<T> = std::result::Result<T, PopularReposError>;
