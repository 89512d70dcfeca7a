//! Error types for the Hiroba chat client.

use thiserror::Error;

use crate::cache::CacheError;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The event stream endpoint answered with a non-success status
    #[error("Unexpected status {0} from event stream")]
    UnexpectedStatus(u16),

    /// An event of type `data` did not carry a valid message payload
    #[error("Malformed event payload '{data}': {source}")]
    MalformedEvent {
        data: String,
        #[source]
        source: serde_json::Error,
    },

    /// Session cache could not be read or written
    #[error(transparent)]
    CacheError(#[from] CacheError),
}
