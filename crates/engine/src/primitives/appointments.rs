//! Appointments facade

use super::into_records;
use crate::database::DocumentStore;
use clinicdb_core::document::ID_FIELD;
use clinicdb_core::{
    Appointment, AppointmentDelete, DocType, NewAppointment, Result, Validate,
};
use serde_json::json;
use std::sync::Arc;

/// Appointment records
#[derive(Debug, Clone)]
pub struct Appointments {
    store: Arc<DocumentStore>,
}

impl Appointments {
    /// Create a facade over a store
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Book an appointment
    ///
    /// Doctor and patient ids are stored as given.
    pub fn create(&self, payload: NewAppointment) -> Result<Appointment> {
        payload.validate()?;
        let doc = self.store.create(
            DocType::Appointment,
            json!({
                "doctor": payload.doctor,
                "patient": payload.patient,
                "appointment": payload.appointment,
            }),
        )?;
        doc.into_typed()
    }

    /// Every appointment, in no particular order
    pub fn list(&self) -> Result<Vec<Appointment>> {
        into_records(self.store.query_by_type(DocType::Appointment, None)?)
    }

    /// Delete an appointment by id, returning what was removed
    ///
    /// An unknown id, or the id of a doctor or patient, removes nothing.
    pub fn delete(&self, request: AppointmentDelete) -> Result<Vec<Appointment>> {
        request.validate()?;
        into_records(self.store.delete_by_predicate(
            DocType::Appointment,
            ID_FIELD,
            request.appointment_id.as_str(),
        )?)
    }
}
