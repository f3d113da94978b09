use thiserror::Error;

/// Error type for feed parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// Payload is not readable text
    #[error("Failed to read data feed: {0}")]
    MalformedInput(#[from] std::str::Utf8Error),

    /// Payload is not a well-formed module feed
    #[error("Wrong data feed: {0}")]
    InvalidFeed(String),
}
