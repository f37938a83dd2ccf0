//! Doctors facade

use super::into_records;
use crate::database::{DocumentStore, FieldEq, JoinMode};
use clinicdb_core::{
    Appointment, DocId, DocType, Doctor, NewDoctor, PatientAssignment, PatientSummary, Result,
    Validate,
};
use serde_json::json;
use std::sync::Arc;

/// Doctor records
#[derive(Debug, Clone)]
pub struct Doctors {
    store: Arc<DocumentStore>,
}

impl Doctors {
    /// Create a facade over a store
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a doctor with an empty patient list
    pub fn create(&self, payload: NewDoctor) -> Result<Doctor> {
        payload.validate()?;
        let doc = self.store.create(
            DocType::Doctor,
            json!({
                "information": payload.information,
                "department": payload.department,
                "patients": [],
            }),
        )?;
        doc.into_typed()
    }

    /// Fetch a doctor; any other document type is NotFound
    pub fn get(&self, id: &DocId) -> Result<Doctor> {
        self.store.get_typed(id, DocType::Doctor)?.into_typed()
    }

    /// Every doctor, in no particular order
    pub fn list(&self) -> Result<Vec<Doctor>> {
        into_records(self.store.query_by_type(DocType::Doctor, None)?)
    }

    /// Add a patient id to the doctor's list, once
    ///
    /// The patient id is not checked; references are not enforced.
    pub fn assign_patient(&self, assignment: PatientAssignment) -> Result<Doctor> {
        assignment.validate()?;
        self.store.get_typed(&assignment.doctor, DocType::Doctor)?;
        self.store
            .append_unique(
                &assignment.doctor,
                "patients",
                json!(assignment.patient.as_str()),
            )?
            .into_typed()
    }

    /// Patients of a doctor
    ///
    /// `serviced = false` lists the assigned patients; `serviced = true`
    /// lists patients carrying a note from this doctor.
    pub fn patients(&self, id: &DocId, serviced: bool) -> Result<Vec<PatientSummary>> {
        let mode = if serviced {
            JoinMode::Serviced
        } else {
            JoinMode::Unserviced
        };
        self.store.query_join_by_reference(mode, id)
    }

    /// Appointments booked with a doctor
    pub fn appointments(&self, id: &DocId) -> Result<Vec<Appointment>> {
        into_records(
            self.store
                .query_by_type(DocType::Appointment, Some(FieldEq::new("doctor", id.as_str())))?,
        )
    }
}
