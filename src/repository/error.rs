use thiserror::Error;

use crate::feed::ParseError;

/// Failure to exchange a request with the origin
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode cache entry: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unsupported cache format: {0}")]
    UnsupportedFormat(u32),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    #[error("Failed to write package: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("No module installer configured")]
    Unavailable,

    #[error("Installation failed: {0}")]
    Failed(String),

    #[error("Installation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("An error occurred while downloading {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error(transparent)]
    Install(#[from] InstallError),
}
