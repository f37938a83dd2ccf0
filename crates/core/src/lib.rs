//! Core types and traits for clinicdb
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId, DocType: Document key and type tag
//! - Document: Stored document with server-owned `type` and `timestamp`
//! - Records: Typed inbound payloads and stored record views
//! - Error: NotFound / KeyExists / ValidationFailed / StoreError
//! - JSON paths: JsonPath and path helpers over `serde_json::Value`
//! - Statements: Parameterized queries (no string-built query text)
//! - Search types: SearchQuery, SearchHit, SearchResponse
//! - Traits: Backend (document storage), SearchService (full-text engine)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod json;
pub mod query;
pub mod records;
pub mod search_types;
pub mod traits;
pub mod types;

pub use document::Document;
pub use error::{codes, Error, ErrorBody, Result, StoreError};
pub use json::{JsonPath, JsonPathError, PathParseError, PathSegment};
pub use query::{Action, Params, Predicate, Projection, Source, Statement};
pub use records::{
    parse_payload, Appointment, AppointmentDelete, ConditionSearch, Doctor, Information,
    NewAppointment, NewDoctor, NewNote, NewPatient, Note, Patient, PatientAssignment,
    PatientSummary, Validate,
};
pub use search_types::{
    Highlight, HighlightStyle, Location, Locations, SearchHit, SearchQuery, SearchResponse,
};
pub use traits::{Backend, Cas, CasOutcome, MutateOutcome, Mutation, SearchService, Versioned};
pub use types::{now_millis, DocId, DocType};
