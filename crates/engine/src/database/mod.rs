//! Document store adapter
//!
//! [`DocumentStore`] is the single component that talks to the backing
//! store. Route handlers and the typed facades in
//! [`primitives`](crate::primitives) are thin callers.
//!
//! # Atomicity
//!
//! Every operation is atomic only for the one document it touches. The
//! two read-modify-write operations (`append_any`, `append_unique`) and
//! each removal of `delete_by_predicate` are CAS-guarded and retried on
//! conflict, so concurrent appends never lose updates. Nothing else is
//! retried.
//!
//! # Example
//!
//! ```
//! use clinicdb_engine::DocumentStore;
//! use clinicdb_core::DocType;
//! use serde_json::json;
//!
//! let store = DocumentStore::in_memory().unwrap();
//! let doctor = store
//!     .create(DocType::Doctor, json!({"department": "Emergency Room"}))
//!     .unwrap();
//! let patient = store.create(DocType::Patient, json!({})).unwrap();
//!
//! store
//!     .append_unique(&doctor.id, "patients", json!(patient.id.as_str()))
//!     .unwrap();
//! ```

mod builder;
pub mod config;
pub mod retry;

pub use builder::DocumentStoreBuilder;
pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use retry::RetryConfig;

use clinicdb_core::document::{ID_FIELD, RESERVED_FIELDS};
use clinicdb_core::json::array_at_path_mut;
use clinicdb_core::{
    Action, Backend, CasOutcome, DocId, DocType, Document, Error, JsonPath, MutateOutcome, PathSegment,
    PatientSummary, Predicate, Projection, Result, SearchQuery, SearchResponse, SearchService,
    Source, Statement, StoreError, Versioned,
};
use retry::{retry_on_conflict, Attempt};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Equality filter on one named field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEq {
    /// Dotted field path, or `id` for the document id
    pub field: String,
    /// Value the field must equal
    pub value: Value,
}

impl FieldEq {
    /// Create a filter
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldEq {
            field: field.into(),
            value: value.into(),
        }
    }

    fn predicate(&self, param: &str) -> Predicate {
        if self.field == ID_FIELD {
            Predicate::id_eq(param)
        } else {
            Predicate::eq(&self.field, param)
        }
    }
}

/// Doctor-to-patient listing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Patients listed in the doctor's `patients` ids
    Unserviced,
    /// Patients with at least one note written by the doctor
    Serviced,
}

/// Array append policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayPolicy {
    /// Always append; duplicates allowed, insertion order kept
    Any,
    /// Append only if no equal element is present
    Unique,
}

/// The document store adapter
pub struct DocumentStore {
    backend: Arc<dyn Backend>,
    search: Arc<dyn SearchService>,
    config: StoreConfig,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("bucket", &self.config.connection.bucket)
            .field("search", &self.search.name())
            .finish()
    }
}

impl DocumentStore {
    /// Start a builder
    pub fn builder() -> DocumentStoreBuilder {
        DocumentStoreBuilder::new()
    }

    /// In-process store and search with default configuration
    pub fn in_memory() -> Result<Self> {
        Self::builder().build()
    }

    /// In-process store and search with the given configuration
    pub fn from_config(config: StoreConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Open with configuration from `clinicdb.toml` in `dir`
    ///
    /// A default config file is written first if none exists.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&path)?;
        Self::from_config(StoreConfig::from_file(&path)?)
    }

    pub(crate) fn from_parts(
        backend: Arc<dyn Backend>,
        search: Arc<dyn SearchService>,
        config: StoreConfig,
    ) -> Self {
        info!(
            target: "clinicdb::store",
            address = %config.connection.address,
            bucket = %config.connection.bucket,
            search = search.name(),
            "document store opened"
        );
        DocumentStore {
            backend,
            search,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying backend
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    // ========================================================================
    // Key operations
    // ========================================================================

    /// Fetch a document by id
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    pub fn get(&self, id: &DocId) -> Result<Document> {
        let versioned = self
            .backend
            .get(id)?
            .ok_or_else(|| Error::not_found(id.clone()))?;
        Document::from_body(id.clone(), versioned.value)
    }

    /// Fetch a document by id, requiring a type
    ///
    /// A document of another type is reported exactly like an absent id.
    pub fn get_typed(&self, id: &DocId, doc_type: DocType) -> Result<Document> {
        let doc = self.get(id)?;
        if doc.doc_type != doc_type {
            debug!(
                target: "clinicdb::store",
                id = %id,
                expected = %doc_type,
                found = %doc.doc_type,
                "type mismatch reported as not found"
            );
            return Err(Error::not_found(id.clone()));
        }
        Ok(doc)
    }

    /// Insert a new document under `id`
    ///
    /// `type` and `timestamp` are server-assigned; caller-supplied `id`,
    /// `type` and `timestamp` keys in the payload are discarded.
    ///
    /// # Errors
    ///
    /// `KeyExists` if `id` is taken; `ValidationFailed` if the payload is
    /// not an object.
    pub fn insert(&self, id: DocId, doc_type: DocType, payload: Value) -> Result<Document> {
        let doc = Document::new(id, doc_type, payload)?;
        self.backend.insert(doc.id.clone(), doc.to_body())?;
        debug!(target: "clinicdb::store", id = %doc.id, doc_type = %doc_type, "insert");
        Ok(doc)
    }

    /// Insert a new document under a generated id
    pub fn create(&self, doc_type: DocType, payload: Value) -> Result<Document> {
        self.insert(DocId::generate(), doc_type, payload)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every document of a type, optionally narrowed by one equality filter
    ///
    /// Order is unspecified.
    pub fn query_by_type(&self, doc_type: DocType, filter: Option<FieldEq>) -> Result<Vec<Document>> {
        let mut stmt = Statement::select(doc_type);
        if let Some(eq) = filter {
            stmt = stmt.filter(eq.predicate("value")).bind("value", eq.value);
        }
        self.query(&stmt)?
            .into_iter()
            .map(row_into_document)
            .collect()
    }

    /// Execute a parameterized statement
    ///
    /// Select rows are the projected document (body plus `id`). Delete rows
    /// are the removed documents.
    ///
    /// # Errors
    ///
    /// `StoreError` (`QUERY_ERROR`) on an unbound parameter or a delete
    /// over a join.
    pub fn query(&self, stmt: &Statement) -> Result<Vec<Value>> {
        stmt.check_bound()?;
        debug!(
            target: "clinicdb::store",
            statement = %stmt.render(&self.config.connection.bucket),
            params = stmt.params.len(),
            "query"
        );

        match (&stmt.source, stmt.action) {
            (Source::Type(doc_type), Action::Select) => {
                let mut rows = Vec::new();
                for (id, versioned) in self.scan_type(*doc_type)? {
                    let row = to_row(&id, &versioned.value);
                    if stmt.accepts(&row)? {
                        rows.push(stmt.projection.apply(&row));
                    }
                }
                Ok(rows)
            }
            (Source::Type(doc_type), Action::Delete) => {
                let mut removed = Vec::new();
                for (id, versioned) in self.scan_type(*doc_type)? {
                    if let Some(row) = self.remove_matching(stmt, &id, versioned)? {
                        removed.push(stmt.projection.apply(&row));
                    }
                }
                debug!(target: "clinicdb::store", removed = removed.len(), "delete");
                Ok(removed)
            }
            (Source::Join { parent, via, child }, Action::Select) => {
                self.select_join(stmt, *parent, via, *child)
            }
            (Source::Join { .. }, Action::Delete) => {
                Err(StoreError::query("delete over a join is not supported").into())
            }
        }
    }

    /// Patients related to a doctor, in the projected summary shape
    ///
    /// - `Unserviced`: patients whose id is in the doctor's `patients` list
    /// - `Serviced`: patients with any note whose `doctor` is `doctor_id`
    pub fn query_join_by_reference(
        &self,
        mode: JoinMode,
        doctor_id: &DocId,
    ) -> Result<Vec<PatientSummary>> {
        let stmt = match mode {
            JoinMode::Unserviced => {
                Statement::join(DocType::Doctor, "patients", DocType::Patient)
                    .filter(Predicate::id_eq("id"))
            }
            JoinMode::Serviced => Statement::select(DocType::Patient)
                .filter(Predicate::any("notes", "doctor", "id")),
        }
        .project(Projection::fields(&["information", "timestamp", "type"]))
        .bind("id", doctor_id.as_str());

        self.query(&stmt)?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    Error::from(StoreError::internal(format!(
                        "patient summary does not match schema: {}",
                        e
                    )))
                })
            })
            .collect()
    }

    fn scan_type(&self, doc_type: DocType) -> Result<Vec<(DocId, Versioned)>> {
        Ok(self
            .backend
            .scan()?
            .into_iter()
            .filter(|(_, v)| has_type(&v.value, doc_type))
            .collect())
    }

    fn select_join(
        &self,
        stmt: &Statement,
        parent: DocType,
        via: &JsonPath,
        child: DocType,
    ) -> Result<Vec<Value>> {
        let all: FxHashMap<DocId, Value> = self
            .backend
            .scan()?
            .into_iter()
            .map(|(id, v)| (id, v.value))
            .collect();

        let mut rows = Vec::new();
        for (id, body) in &all {
            if !has_type(body, parent) || !stmt.accepts(&to_row(id, body))? {
                continue;
            }
            let Some(Value::Array(keys)) = clinicdb_core::json::get_at_path(body, via) else {
                continue;
            };
            for key in keys.iter().filter_map(Value::as_str) {
                let key = DocId::new(key);
                if let Some(child_body) = all.get(&key).filter(|b| has_type(b, child)) {
                    rows.push(stmt.projection.apply(&to_row(&key, child_body)));
                }
            }
        }
        Ok(rows)
    }

    /// Remove one candidate if it still matches, re-checking after conflicts
    fn remove_matching(
        &self,
        stmt: &Statement,
        id: &DocId,
        first: Versioned,
    ) -> Result<Option<Value>> {
        let mut current = Some(first);
        retry_on_conflict(&self.config.retry, id, || {
            let versioned = match current.take() {
                Some(v) => v,
                None => match self.backend.get(id)? {
                    Some(v) => v,
                    None => return Ok(Attempt::Done(None)),
                },
            };
            let row = to_row(id, &versioned.value);
            if !stmt.accepts(&row)? {
                return Ok(Attempt::Done(None));
            }
            match self.backend.remove_if(id, versioned.cas) {
                Ok(CasOutcome::Applied(_)) => Ok(Attempt::Done(Some(row))),
                Ok(CasOutcome::Conflict) => Ok(Attempt::Conflict),
                Err(e) if e.is_not_found() => Ok(Attempt::Done(None)),
                Err(e) => Err(e),
            }
        })
    }

    // ========================================================================
    // Partial mutation
    // ========================================================================

    /// Append `value` to the array at `field`, duplicates allowed
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent; `PATH_MISMATCH` if something other
    /// than an array or object is in the way.
    pub fn append_any(&self, id: &DocId, field: &str, value: Value) -> Result<Document> {
        self.mutate_array(id, field, value, ArrayPolicy::Any)
    }

    /// Append `value` to the array at `field` unless an equal element exists
    ///
    /// Idempotent: repeating the call leaves the array unchanged and does
    /// not write.
    pub fn append_unique(&self, id: &DocId, field: &str, value: Value) -> Result<Document> {
        self.mutate_array(id, field, value, ArrayPolicy::Unique)
    }

    /// Read-modify-write of one array field
    ///
    /// Missing objects along the path and the array itself are created.
    /// Runs as one atomic mutation when the backend supports it, otherwise
    /// as a CAS loop retried on conflict.
    pub fn mutate_array(
        &self,
        id: &DocId,
        field: &str,
        value: Value,
        policy: ArrayPolicy,
    ) -> Result<Document> {
        let path = mutable_path(field)?;

        let mut updated = None;
        let outcome = {
            let mut mutation = |body: &Value| -> Result<Option<Value>> {
                let (doc, changed) = append_to(id, body.clone(), &path, &value, policy)?;
                let replacement = changed.then(|| doc.to_body());
                updated = Some(doc);
                Ok(replacement)
            };
            self.backend.mutate(id, &mut mutation)?
        };

        let doc = match (outcome, updated) {
            (MutateOutcome::Applied(_) | MutateOutcome::Unchanged, Some(doc)) => doc,
            (MutateOutcome::Unsupported, _) => retry_on_conflict(&self.config.retry, id, || {
                let current = self
                    .backend
                    .get(id)?
                    .ok_or_else(|| Error::not_found(id.clone()))?;
                let (doc, changed) = append_to(id, current.value, &path, &value, policy)?;
                if !changed {
                    return Ok(Attempt::Done(doc));
                }
                match self.backend.replace_if(id, doc.to_body(), current.cas)? {
                    CasOutcome::Applied(_) => Ok(Attempt::Done(doc)),
                    CasOutcome::Conflict => Ok(Attempt::Conflict),
                }
            })?,
            (outcome, None) => {
                return Err(StoreError::internal(format!(
                    "backend reported {:?} for {} without running the mutation",
                    outcome, id
                ))
                .into())
            }
        };

        debug!(target: "clinicdb::store", id = %id, field, policy = ?policy, "array append");
        Ok(doc)
    }

    // ========================================================================
    // Delete and search
    // ========================================================================

    /// Delete every document of a type whose `field` equals `value`
    ///
    /// Returns exactly the documents removed. `field` may be `id`.
    pub fn delete_by_predicate(
        &self,
        doc_type: DocType,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Document>> {
        let eq = FieldEq::new(field, value);
        let stmt = Statement::delete(doc_type)
            .filter(eq.predicate("value"))
            .bind("value", eq.value);
        self.query(&stmt)?
            .into_iter()
            .map(row_into_document)
            .collect()
    }

    /// Full-text search, passed through to the search service
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let response = self.search.query(query)?;
        debug!(
            target: "clinicdb::store",
            index = %query.index,
            hits = response.len(),
            total = response.total_hits,
            "search"
        );
        Ok(response)
    }
}

/// Append `value` to the array at `path` in a stored body
///
/// Returns the updated document and whether the array changed.
fn append_to(
    id: &DocId,
    body: Value,
    path: &JsonPath,
    value: &Value,
    policy: ArrayPolicy,
) -> Result<(Document, bool)> {
    let mut doc = Document::from_body(id.clone(), body)?;
    let mut payload = Value::Object(std::mem::take(&mut doc.payload));
    let array = array_at_path_mut(&mut payload, path)
        .map_err(|e| StoreError::path_mismatch(e.to_string()))?;
    let changed = !(policy == ArrayPolicy::Unique && array.contains(value));
    if changed {
        array.push(value.clone());
    }
    if let Value::Object(map) = payload {
        doc.payload = map;
    }
    Ok((doc, changed))
}

fn has_type(body: &Value, doc_type: DocType) -> bool {
    body.get("type").and_then(Value::as_str) == Some(doc_type.as_str())
}

/// Body plus `id`
fn to_row(id: &DocId, body: &Value) -> Value {
    let mut row = body.clone();
    if let Value::Object(obj) = &mut row {
        obj.insert(ID_FIELD.to_string(), Value::from(id.as_str()));
    }
    row
}

fn row_into_document(row: Value) -> Result<Document> {
    let id = row
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(DocId::new)
        .ok_or_else(|| StoreError::internal("query row has no id"))?;
    Document::from_body(id, row)
}

/// Parse an array field path; reserved top-level fields are not mutable
fn mutable_path(field: &str) -> Result<JsonPath> {
    let path: JsonPath = field
        .parse()
        .map_err(|e| StoreError::path_mismatch(format!("invalid field path '{}': {}", field, e)))?;
    match path.segments().first() {
        Some(PathSegment::Key(key)) if RESERVED_FIELDS.contains(&key.as_str()) => Err(
            StoreError::path_mismatch(format!("field '{}' is server-owned", key)).into(),
        ),
        Some(PathSegment::Key(_)) => Ok(path),
        _ => Err(StoreError::path_mismatch(format!(
            "field path '{}' must start with a key",
            field
        ))
        .into()),
    }
}
