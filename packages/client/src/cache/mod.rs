//! Session cache: state that survives remounts of a view.
//!
//! A [`SessionStore`] holds one JSON object (the session entry). Views bind
//! a [`CachedState`] to one key of that object, so re-creating a view under
//! the same key resumes from the last written value instead of the initial
//! one.

mod state;
mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use state::{CachedState, PREVIOUS_CACHE_KEY_FIELD};
pub use store::{Entry, SessionStore};

/// Session cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cached value could not be converted to JSON
    #[error("Failed to serialize cached value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The session entry could not be encoded for the session file
    #[error("Failed to encode session entry: {0}")]
    Encode(#[source] serde_json::Error),

    /// The session file could not be read or written
    #[error("Session file '{}' is not accessible: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
