//! Patients facade and condition search

use super::into_records;
use crate::database::{DocumentStore, FieldEq};
use clinicdb_core::{
    now_millis, Appointment, ConditionSearch, DocId, DocType, HighlightStyle, NewNote, NewPatient,
    Note, Patient, Result, SearchQuery, SearchResponse, Validate,
};
use clinicdb_search::IndexDefinition;
use serde_json::json;
use std::sync::Arc;

/// Fields analyzed and returned by condition search
pub const CONDITION_FIELDS: [&str; 3] = [
    "information.firstname",
    "information.lastname",
    "notes.message",
];

/// Field highlighted in condition search hits
pub const CONDITION_HIGHLIGHT_FIELD: &str = "notes.message";

/// Condition search index over patients
pub fn condition_index(name: &str) -> IndexDefinition {
    IndexDefinition::new(name, DocType::Patient, CONDITION_FIELDS)
}

/// Patient records
#[derive(Debug, Clone)]
pub struct Patients {
    store: Arc<DocumentStore>,
}

impl Patients {
    /// Create a facade over a store
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a patient with no notes
    pub fn create(&self, payload: NewPatient) -> Result<Patient> {
        payload.validate()?;
        let doc = self.store.create(
            DocType::Patient,
            json!({
                "information": payload.information,
                "notes": [],
            }),
        )?;
        doc.into_typed()
    }

    /// Fetch a patient; any other document type is NotFound
    pub fn get(&self, id: &DocId) -> Result<Patient> {
        self.store.get_typed(id, DocType::Patient)?.into_typed()
    }

    /// Every patient, in no particular order
    pub fn list(&self) -> Result<Vec<Patient>> {
        into_records(self.store.query_by_type(DocType::Patient, None)?)
    }

    /// Append a note, stamped with the server time
    ///
    /// Returns the note as stored.
    pub fn add_note(&self, id: &DocId, payload: NewNote) -> Result<Note> {
        payload.validate()?;
        self.store.get_typed(id, DocType::Patient)?;
        let note = Note {
            doctor: payload.doctor,
            message: payload.message,
            timestamp: now_millis(),
        };
        self.store.append_any(id, "notes", serde_json::to_value(&note)?)?;
        Ok(note)
    }

    /// Appointments booked for a patient
    pub fn appointments(&self, id: &DocId) -> Result<Vec<Appointment>> {
        into_records(
            self.store
                .query_by_type(DocType::Appointment, Some(FieldEq::new("patient", id.as_str())))?,
        )
    }

    /// Free-text search over names and notes
    ///
    /// Hits carry the name and note fields, with matches in notes
    /// highlighted as HTML.
    pub fn search_conditions(&self, request: ConditionSearch) -> Result<SearchResponse> {
        request.validate()?;
        let mut query = SearchQuery::new(self.store.config().search.index.clone(), request.search)
            .with_fields(CONDITION_FIELDS)
            .with_highlight(HighlightStyle::Html, [CONDITION_HIGHLIGHT_FIELD]);
        if let Some(distance) = request.fuzziness {
            query = query.with_fuzziness(distance);
        }
        self.store.search(&query)
    }
}
