//! Sharded in-process document store
//!
//! DashMap keyed by document id. Reads never block each other and a write
//! only locks the shard holding its key.
//!
//! # CAS tokens
//!
//! Every successful write draws a fresh token from one global counter, so
//! a token is never reused for the same id even after remove + insert.
//! Tokens start at 1; 0 is never handed out.

use clinicdb_core::{
    Backend, Cas, CasOutcome, DocId, Error, MutateOutcome, Mutation, Result, Versioned,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// DashMap-backed [`Backend`]
#[derive(Debug)]
pub struct ShardedStore {
    docs: DashMap<DocId, Versioned>,
    next_cas: AtomicU64,
}

impl ShardedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
            next_cas: AtomicU64::new(1),
        }
    }

    /// Create with expected capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            docs: DashMap::with_capacity(capacity),
            next_cas: AtomicU64::new(1),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Whether an id is present
    pub fn contains(&self, id: &DocId) -> bool {
        self.docs.contains_key(id)
    }

    /// CAS token most recently handed out (0 before the first write)
    pub fn current_cas(&self) -> Cas {
        self.next_cas.load(Ordering::Acquire) - 1
    }

    #[inline]
    fn allocate_cas(&self) -> Cas {
        self.next_cas.fetch_add(1, Ordering::AcqRel)
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ShardedStore {
    fn get(&self, id: &DocId) -> Result<Option<Versioned>> {
        Ok(self.docs.get(id).map(|entry| entry.value().clone()))
    }

    fn insert(&self, id: DocId, value: Value) -> Result<Cas> {
        match self.docs.entry(id) {
            Entry::Occupied(occupied) => {
                debug!(target: "clinicdb::storage", id = %occupied.key(), "insert rejected, key exists");
                Err(Error::key_exists(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                let cas = self.allocate_cas();
                trace!(target: "clinicdb::storage", id = %vacant.key(), cas, "insert");
                vacant.insert(Versioned::new(value, cas));
                Ok(cas)
            }
        }
    }

    fn replace_if(&self, id: &DocId, value: Value, cas: Cas) -> Result<CasOutcome> {
        let mut entry = self.docs.get_mut(id).ok_or_else(|| Error::not_found(id.clone()))?;
        if entry.cas != cas {
            debug!(
                target: "clinicdb::storage",
                id = %id,
                expected = cas,
                actual = entry.cas,
                "replace conflict"
            );
            return Ok(CasOutcome::Conflict);
        }
        let new_cas = self.allocate_cas();
        *entry = Versioned::new(value, new_cas);
        trace!(target: "clinicdb::storage", id = %id, cas = new_cas, "replace");
        Ok(CasOutcome::Applied(new_cas))
    }

    fn remove_if(&self, id: &DocId, cas: Cas) -> Result<CasOutcome> {
        match self.docs.remove_if(id, |_, stored| stored.cas == cas) {
            Some(_) => {
                trace!(target: "clinicdb::storage", id = %id, cas, "remove");
                Ok(CasOutcome::Applied(cas))
            }
            None if self.docs.contains_key(id) => {
                debug!(target: "clinicdb::storage", id = %id, expected = cas, "remove conflict");
                Ok(CasOutcome::Conflict)
            }
            None => Err(Error::not_found(id.clone())),
        }
    }

    fn mutate(&self, id: &DocId, mutation: &mut Mutation<'_>) -> Result<MutateOutcome> {
        let mut entry = self.docs.get_mut(id).ok_or_else(|| Error::not_found(id.clone()))?;
        match mutation(&entry.value)? {
            Some(value) => {
                let cas = self.allocate_cas();
                *entry = Versioned::new(value, cas);
                trace!(target: "clinicdb::storage", id = %id, cas, "mutate");
                Ok(MutateOutcome::Applied(cas))
            }
            None => Ok(MutateOutcome::Unchanged),
        }
    }

    fn scan(&self) -> Result<Vec<(DocId, Versioned)>> {
        Ok(self
            .docs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}
