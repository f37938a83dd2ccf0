//! Full-text search for clinicdb
//!
//! This crate provides:
//! - LocalSearch: in-process `SearchService` over a `Backend`
//! - IndexDefinition: named index over one document type's text fields
//! - Scorer trait and BM25LiteScorer default implementation
//! - Tokenizer with byte offsets, fuzzy term matching, highlighting
//!
//! # Usage
//!
//! ```
//! use clinicdb_core::{DocType, SearchQuery, SearchService};
//! use clinicdb_search::{IndexDefinition, LocalSearch};
//! use clinicdb_storage::ShardedStore;
//! use std::sync::Arc;
//!
//! let search = LocalSearch::new(Arc::new(ShardedStore::new()));
//! search
//!     .register_index(IndexDefinition::new(
//!         "medical-condition",
//!         DocType::Patient,
//!         ["notes.message"],
//!     ))
//!     .unwrap();
//! let resp = search.query(&SearchQuery::new("medical-condition", "fever")).unwrap();
//! assert!(resp.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fuzzy;
pub mod highlight;
pub mod index;
pub mod scorer;
pub mod tokenizer;

pub use fuzzy::{levenshtein, term_matches, MAX_FUZZINESS};
pub use highlight::highlight;
pub use index::{IndexDefinition, LocalSearch};
pub use scorer::{BM25LiteScorer, Scorer, ScorerContext, SearchDoc};
pub use tokenizer::{tokenize, tokenize_unique, tokenize_with_offsets, Token};
