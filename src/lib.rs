//! clinicdb - document store adapter for a medical-records domain
//!
//! Doctors, patients and appointments are JSON documents in a keyed store.
//! The [`DocumentStore`] owns every interaction with that store: key-based
//! get and insert, filtered queries, in-place array appends, delete with
//! return, and a pass-through to a full-text search service.
//!
//! # Quick Start
//!
//! ```
//! use clinicdb::{Doctors, DocumentStore, Information, NewDoctor};
//! use std::sync::Arc;
//!
//! let store = Arc::new(DocumentStore::in_memory().unwrap());
//! let doctors = Doctors::new(store);
//!
//! let doctor = doctors
//!     .create(NewDoctor {
//!         information: Information {
//!             first_name: "Meredith".into(),
//!             last_name: "Grey".into(),
//!             gender: "female".into(),
//!         },
//!         department: "Emergency Room".into(),
//!     })
//!     .unwrap();
//! assert_eq!(doctors.get(&doctor.id).unwrap(), doctor);
//! ```
//!
//! # Architecture
//!
//! The backing store and the search engine sit behind the [`Backend`] and
//! [`SearchService`] traits. The in-process [`ShardedStore`] and
//! [`LocalSearch`] implement them for tests and embedded use.

pub use clinicdb_core::*;
pub use clinicdb_engine::*;
pub use clinicdb_search::{IndexDefinition, LocalSearch};
pub use clinicdb_storage::ShardedStore;
