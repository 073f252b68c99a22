//! Unified error types for Trellis.
//!
//! The pure scheduling and gate functions are total and never return errors;
//! everything here originates at the boundaries: storage, configuration, and
//! content (curriculum/deck) loading. The CLI treats missing learner state as
//! "no state yet" rather than a failure, via the [`FailOpen`] helpers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// I/O errors from state/progress file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed curriculum or deck content (bad thresholds, dangling links).
    #[error("content error: {message}")]
    Content { message: String },

    /// Curriculum node not found in the path document.
    #[error("node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// Deck manifest not found or unreadable.
    #[error("deck not found: {deck_id}")]
    DeckNotFound { deck_id: String },
}

/// A specialized Result type for Trellis operations.
pub type Result<T> = std::result::Result<T, TrellisError>;

impl TrellisError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a content error.
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content {
            message: message.into(),
        }
    }

    /// Create a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create a deck-not-found error.
    pub fn deck_not_found(deck_id: impl Into<String>) -> Self {
        Self::DeckNotFound {
            deck_id: deck_id.into(),
        }
    }
}

impl From<io::Error> for TrellisError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrellisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Learner-state reads should never block the learner: a missing or corrupt
/// record is treated as "never studied" rather than propagated as a failure.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}
