use reqwest::StatusCode;
use thiserror::Error;

/// No usable response was obtained from a remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("transport failure: {0}")]
    Transport(String),
}
