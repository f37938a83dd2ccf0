//! Error types for clinicdb
//!
//! Every failure the adapter can produce is one of four kinds. Callers map
//! them to a structured `{code, message}` body via [`Error::body`]; nothing
//! here is retried or swallowed.

use crate::types::DocId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for clinicdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes surfaced to callers
///
/// `KEY_ENOENT` and `KEY_EEXISTS` keep the values the document database SDK
/// reports, so a missing document and a document of the wrong type produce
/// an identical body.
pub mod codes {
    /// Key already exists (duplicate insert)
    pub const KEY_EEXISTS: u32 = 12;
    /// Key does not exist
    pub const KEY_ENOENT: u32 = 13;
    /// Payload failed validation
    pub const VALIDATION: u32 = 400;
    /// Generic backend failure
    pub const INTERNAL: u32 = 500;
    /// Statement could not be evaluated (unbound parameter, bad path)
    pub const QUERY_ERROR: u32 = 4000;
    /// Optimistic write kept losing to concurrent writers
    pub const CAS_CONFLICT: u32 = 4010;
    /// Path inside a document had the wrong shape for the mutation
    pub const PATH_MISMATCH: u32 = 4020;
    /// Search index is not registered
    pub const SEARCH_INDEX_NOT_FOUND: u32 = 5000;
}

/// Message reported for a missing key
pub const NOT_FOUND_MESSAGE: &str = "The key does not exist on the server";

/// Message reported for a duplicate key
pub const KEY_EXISTS_MESSAGE: &str = "The key already exists in the server";

/// A backing-store failure with its code and message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store error {code}: {message}")]
pub struct StoreError {
    /// Numeric code (see [`codes`])
    pub code: u32,
    /// Human-readable description
    pub message: String,
}

impl StoreError {
    /// Create a store error with an explicit code
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        StoreError {
            code,
            message: message.into(),
        }
    }

    /// Generic backend failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    /// Statement evaluation failure
    pub fn query(message: impl Into<String>) -> Self {
        Self::new(codes::QUERY_ERROR, message)
    }

    /// Conflict retries exhausted
    pub fn cas_conflict(message: impl Into<String>) -> Self {
        Self::new(codes::CAS_CONFLICT, message)
    }

    /// Path shape mismatch during a partial mutation
    pub fn path_mismatch(message: impl Into<String>) -> Self {
        Self::new(codes::PATH_MISMATCH, message)
    }
}

/// Error types for the document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Id absent, or present with a different type than the caller expected
    #[error("The key does not exist on the server: {id}")]
    NotFound {
        /// The id that was looked up
        id: DocId,
    },

    /// Insert collided with an existing id
    #[error("The key already exists in the server: {id}")]
    KeyExists {
        /// The id that already exists
        id: DocId,
    },

    /// Malformed or incomplete input payload
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Any other backing-store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Not-found error for an id
    pub fn not_found(id: impl Into<DocId>) -> Self {
        Error::NotFound { id: id.into() }
    }

    /// Duplicate-key error for an id
    pub fn key_exists(id: impl Into<DocId>) -> Self {
        Error::KeyExists { id: id.into() }
    }

    /// Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationFailed(message.into())
    }

    /// Numeric code for this error
    pub fn code(&self) -> u32 {
        match self {
            Error::NotFound { .. } => codes::KEY_ENOENT,
            Error::KeyExists { .. } => codes::KEY_EEXISTS,
            Error::ValidationFailed(_) => codes::VALIDATION,
            Error::Store(e) => e.code,
        }
    }

    /// Whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Caller-visible body
    ///
    /// NotFound omits the id: an absent document and a document of the
    /// wrong type render identically.
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            Error::NotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            Error::KeyExists { .. } => KEY_EXISTS_MESSAGE.to_string(),
            Error::ValidationFailed(msg) => msg.clone(),
            Error::Store(e) => e.message.clone(),
        };
        ErrorBody {
            code: self.code(),
            message,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Store(StoreError::internal(format!("serialization error: {}", e)))
    }
}

/// Structured error body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric code
    pub code: u32,
    /// Description
    pub message: String,
}
