//! Typed record facades
//!
//! Stateless facades over the document store, one per document type:
//! - **Doctors**: create, get, list, patient assignment, patient listings
//! - **Patients**: create, get, list, notes, condition search
//! - **Appointments**: create, list, delete by id
//!
//! Each facade holds only an `Arc<DocumentStore>`. Inbound payloads are
//! validated before the store is called, and stored documents come back
//! as typed records carrying their id.

pub mod appointments;
pub mod doctors;
pub mod patients;

pub use appointments::Appointments;
pub use doctors::Doctors;
pub use patients::Patients;

use clinicdb_core::{Document, Result};
use serde::de::DeserializeOwned;

fn into_records<T: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<T>> {
    docs.into_iter().map(Document::into_typed).collect()
}
