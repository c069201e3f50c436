use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoLikesError {
    #[error("Failed to fetch repositories: {0}")]
    FetchFailure(String),

    #[error("Failed to like repository {id}: {reason}")]
    LikeFailure { id: String, reason: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Remote API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Failed to start controller: {0}")]
    SpawnError(String),
}

pub type Result<T> = std::result::Result<T, RepoLikesError>;
