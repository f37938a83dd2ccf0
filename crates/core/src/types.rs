//! Core types for clinicdb
//!
//! This module defines the foundational types:
//! - DocId: Opaque document key (generated as a UUID v4)
//! - DocType: Type tag stored in every document
//! - now_millis: Server-side timestamp source

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque document identifier
///
/// Ids are assigned by the store at insert time as UUID v4 strings, but
/// lookups accept any string: an id that was never issued simply does
/// not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Generate a fresh random id (UUID v4, hyphenated)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DocId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Document type tag
///
/// Stored as the top-level `type` field of every document. Written by the
/// store on insert and never taken from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// A doctor record
    Doctor,
    /// A patient record
    Patient,
    /// An appointment between a doctor and a patient
    Appointment,
}

impl DocType {
    /// All type tags
    pub const ALL: [DocType; 3] = [DocType::Doctor, DocType::Patient, DocType::Appointment];

    /// Wire name as stored in the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Doctor => "doctor",
            DocType::Patient => "patient",
            DocType::Appointment => "appointment",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(DocType::Doctor),
            "patient" => Ok(DocType::Patient),
            "appointment" => Ok(DocType::Appointment),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
