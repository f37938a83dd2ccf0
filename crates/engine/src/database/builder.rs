//! Builder for [`DocumentStore`]
//!
//! ```
//! use clinicdb_engine::{DocumentStore, RetryConfig, StoreConfig};
//!
//! let mut config = StoreConfig::default();
//! config.retry = RetryConfig::new().with_max_retries(8);
//!
//! let store = DocumentStore::builder().config(config).build().unwrap();
//! assert_eq!(store.config().retry.max_retries, 8);
//! ```
//!
//! Without an explicit backend the builder uses an in-process
//! `ShardedStore`. Without an explicit search service it uses a
//! `LocalSearch` over the chosen backend, with the patient condition index
//! registered under the configured name.

use super::{DocumentStore, StoreConfig};
use crate::primitives::patients::condition_index;
use clinicdb_core::{Backend, Result, SearchService};
use clinicdb_search::LocalSearch;
use clinicdb_storage::ShardedStore;
use std::sync::Arc;

/// Builder for DocumentStore
#[derive(Default)]
pub struct DocumentStoreBuilder {
    config: StoreConfig,
    backend: Option<Arc<dyn Backend>>,
    search: Option<Arc<dyn SearchService>>,
}

impl DocumentStoreBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific backend
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a specific search service
    pub fn search(mut self, search: Arc<dyn SearchService>) -> Self {
        self.search = Some(search);
        self
    }

    /// Validate configuration and assemble the store
    pub fn build(self) -> Result<DocumentStore> {
        self.config.validate()?;

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(ShardedStore::new()));
        let search: Arc<dyn SearchService> = match self.search {
            Some(search) => search,
            None => {
                let local = LocalSearch::new(Arc::clone(&backend));
                local.register_index(condition_index(&self.config.search.index))?;
                Arc::new(local)
            }
        };

        Ok(DocumentStore::from_parts(backend, search, self.config))
    }
}
