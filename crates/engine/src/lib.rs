//! Document store engine for clinicdb
//!
//! This crate ties the lower layers together:
//! - DocumentStore: get/insert/query/append/delete/search over a `Backend`
//! - Parameterized statement execution, including key joins
//! - CAS conflict retry for read-modify-write
//! - Configuration via `clinicdb.toml`
//! - Typed facades: Doctors, Patients, Appointments

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod primitives;

pub use database::config::{ConnectionConfig, SearchConfig, DEFAULT_SEARCH_INDEX};
pub use database::{
    ArrayPolicy, DocumentStore, DocumentStoreBuilder, FieldEq, JoinMode, RetryConfig, StoreConfig,
    CONFIG_FILE_NAME,
};
pub use primitives::{Appointments, Doctors, Patients};
