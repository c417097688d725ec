use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain the country dataset.
///
/// Never retried internally; the game loop renders it and keeps the session alive.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("request to country data source failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("country data source responded with {0}")]
    Status(StatusCode),

    #[error("country data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("failed to read country data: {0}")]
    Io(#[from] std::io::Error),

    #[error("country data source returned no usable countries")]
    Empty,
}

/// Failure to download or decode a flag image. Non-fatal.
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("flag request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("flag server responded with {0}")]
    Status(StatusCode),

    #[error("flag image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}
