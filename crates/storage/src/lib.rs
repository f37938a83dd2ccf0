//! Storage layer for clinicdb
//!
//! This crate implements the in-process document backend:
//! - ShardedStore: DashMap-backed `Backend` with per-document CAS tokens
//!
//! A network client for a real document database would sit beside
//! `ShardedStore` and implement the same `clinicdb_core::Backend` trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::ShardedStore;
