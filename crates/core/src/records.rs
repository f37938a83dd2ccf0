//! Typed record schemas for the medical-records domain
//!
//! Inbound payloads (`New*`, `PatientAssignment`, ...) reject unknown fields,
//! which also rejects caller-supplied `type` and `timestamp`. They are
//! parsed with [`parse_payload`] and checked with [`Validate`] before any
//! store call. Outbound records (`Doctor`, `Patient`, ...) deserialize from
//! the row shape produced by [`Document::to_row`](crate::Document::to_row).

use crate::error::{Error, Result};
use crate::types::{DocId, DocType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boundary validation for inbound payloads
pub trait Validate {
    /// Check semantic constraints that the schema cannot express
    fn validate(&self) -> Result<()>;
}

/// Parse and validate an inbound JSON payload
///
/// Schema violations (missing fields, wrong types, unknown or forbidden
/// fields) and failed [`Validate`] checks both become `ValidationFailed`.
pub fn parse_payload<T: DeserializeOwned + Validate>(value: Value) -> Result<T> {
    let payload: T =
        serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))?;
    payload.validate()?;
    Ok(payload)
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Personal information shared by doctors and patients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Information {
    /// Given name
    #[serde(rename = "firstname")]
    pub first_name: String,
    /// Family name
    #[serde(rename = "lastname")]
    pub last_name: String,
    /// Gender as entered
    pub gender: String,
}

impl Validate for Information {
    fn validate(&self) -> Result<()> {
        require("information.firstname", &self.first_name)?;
        require("information.lastname", &self.last_name)?;
        require("information.gender", &self.gender)
    }
}

// ============================================================================
// Inbound payloads
// ============================================================================

/// Payload for creating a doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDoctor {
    /// Personal information
    pub information: Information,
    /// Department name
    pub department: String,
}

impl Validate for NewDoctor {
    fn validate(&self) -> Result<()> {
        self.information.validate()?;
        require("department", &self.department)
    }
}

/// Payload for creating a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPatient {
    /// Personal information
    pub information: Information,
}

impl Validate for NewPatient {
    fn validate(&self) -> Result<()> {
        self.information.validate()
    }
}

/// Payload for appending a note to a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewNote {
    /// Authoring doctor
    pub doctor: DocId,
    /// Note text
    pub message: String,
}

impl Validate for NewNote {
    fn validate(&self) -> Result<()> {
        require("doctor", self.doctor.as_str())?;
        require("message", &self.message)
    }
}

/// Payload for creating an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAppointment {
    /// Doctor id
    pub doctor: DocId,
    /// Patient id
    pub patient: DocId,
    /// Appointment time (milliseconds since epoch)
    pub appointment: i64,
}

impl Validate for NewAppointment {
    fn validate(&self) -> Result<()> {
        require("doctor", self.doctor.as_str())?;
        require("patient", self.patient.as_str())
    }
}

/// Payload for assigning a patient to a doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientAssignment {
    /// Doctor id
    pub doctor: DocId,
    /// Patient id
    pub patient: DocId,
}

impl Validate for PatientAssignment {
    fn validate(&self) -> Result<()> {
        require("doctor", self.doctor.as_str())?;
        require("patient", self.patient.as_str())
    }
}

/// Payload for deleting an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppointmentDelete {
    /// Appointment id
    #[serde(rename = "appointmentid")]
    pub appointment_id: DocId,
}

impl Validate for AppointmentDelete {
    fn validate(&self) -> Result<()> {
        require("appointmentid", self.appointment_id.as_str())
    }
}

/// Payload for a free-text condition search over patients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionSearch {
    /// Text to match
    pub search: String,
    /// Optional edit distance for fuzzy term matching
    #[serde(default)]
    pub fuzziness: Option<u8>,
}

impl Validate for ConditionSearch {
    fn validate(&self) -> Result<()> {
        require("search", &self.search)
    }
}

// ============================================================================
// Stored records
// ============================================================================

/// A note embedded in a patient document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Authoring doctor
    pub doctor: DocId,
    /// Note text
    pub message: String,
    /// Server time the note was appended
    pub timestamp: i64,
}

/// A stored doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    /// Document id
    pub id: DocId,
    /// Personal information
    pub information: Information,
    /// Department name
    pub department: String,
    /// Assigned patient ids, unique, in assignment order
    #[serde(default)]
    pub patients: Vec<DocId>,
    /// Creation time
    pub timestamp: i64,
}

/// A stored patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Document id
    pub id: DocId,
    /// Personal information
    pub information: Information,
    /// Notes in append order
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Creation time
    pub timestamp: i64,
}

/// A stored appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Document id
    pub id: DocId,
    /// Doctor id
    pub doctor: DocId,
    /// Patient id
    pub patient: DocId,
    /// Appointment time
    pub appointment: i64,
    /// Creation time
    pub timestamp: i64,
}

/// Projected patient row returned by doctor-to-patient listings
///
/// `information` is passed through as stored: a patient written with
/// extra keys or without the field still lists, with `Null` for a
/// missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    /// Patient id
    pub id: DocId,
    /// Personal information, as stored
    #[serde(default)]
    pub information: Value,
    /// Creation time
    pub timestamp: i64,
    /// Always `patient`
    #[serde(rename = "type")]
    pub doc_type: DocType,
}
