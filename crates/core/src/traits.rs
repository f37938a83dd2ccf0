//! Core traits for storage and search abstraction
//!
//! `Backend` is the seam to the document database: the in-process
//! `ShardedStore` implements it, and so would a network client.
//! `SearchService` is the seam to the full-text engine.
//!
//! Thread safety: implementations are shared across request threads, so
//! both traits require `Send + Sync`.

use crate::error::Result;
use crate::search_types::{SearchQuery, SearchResponse};
use crate::types::DocId;
use serde_json::Value;

/// Compare-and-swap token identifying one stored version of a document
pub type Cas = u64;

/// A stored body with its CAS token
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    /// Document body (`type`, `timestamp` and payload fields)
    pub value: Value,
    /// CAS of this version
    pub cas: Cas,
}

impl Versioned {
    /// Create a versioned body
    pub fn new(value: Value, cas: Cas) -> Self {
        Versioned { value, cas }
    }
}

/// Result of a CAS-guarded write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Write applied; carries the new CAS (or the removed version's CAS)
    Applied(Cas),
    /// The stored CAS no longer matched
    Conflict,
}

impl CasOutcome {
    /// Whether the write applied
    pub fn is_applied(&self) -> bool {
        matches!(self, CasOutcome::Applied(_))
    }
}

/// Result of an in-place mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateOutcome {
    /// The replacement was written; carries the new CAS
    Applied(Cas),
    /// The mutation chose not to write
    Unchanged,
    /// The backend has no server-side mutation; use a CAS loop instead
    Unsupported,
}

/// In-place mutation: sees the stored body and returns its replacement,
/// or `None` to leave the document as it is
pub type Mutation<'a> = dyn FnMut(&Value) -> Result<Option<Value>> + 'a;

/// Key-value document storage
///
/// Every method is atomic with respect to the single document it targets.
/// There is no cross-document transaction.
pub trait Backend: Send + Sync {
    /// Fetch a document body and its CAS
    ///
    /// Returns `None` if the id is absent.
    fn get(&self, id: &DocId) -> Result<Option<Versioned>>;

    /// Store a new document
    ///
    /// # Errors
    ///
    /// `KeyExists` if the id is already present; the stored document is
    /// left unchanged.
    fn insert(&self, id: DocId, value: Value) -> Result<Cas>;

    /// Replace a document if its CAS still matches
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    fn replace_if(&self, id: &DocId, value: Value, cas: Cas) -> Result<CasOutcome>;

    /// Remove a document if its CAS still matches
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    fn remove_if(&self, id: &DocId, cas: Cas) -> Result<CasOutcome>;

    /// Apply `mutation` to one document atomically
    ///
    /// No other write to `id` can interleave between the read the
    /// mutation sees and the write it returns. An error from the mutation
    /// aborts without writing. The default returns `Unsupported` without
    /// calling the mutation.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    fn mutate(&self, id: &DocId, mutation: &mut Mutation<'_>) -> Result<MutateOutcome> {
        let _ = (id, mutation);
        Ok(MutateOutcome::Unsupported)
    }

    /// Snapshot of every stored document
    ///
    /// Order is unspecified. Writes concurrent with the scan may or may not
    /// be visible.
    fn scan(&self) -> Result<Vec<(DocId, Versioned)>>;
}

/// External full-text search engine
pub trait SearchService: Send + Sync {
    /// Run a match query; hits come back by descending score
    fn query(&self, query: &SearchQuery) -> Result<SearchResponse>;

    /// Name for logging
    fn name(&self) -> &str;
}
