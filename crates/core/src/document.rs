//! Document model
//!
//! A [`Document`] is an id, a type tag, a server timestamp and an opaque
//! JSON payload. The backing store sees a flattened body: payload fields
//! plus top-level `type` and `timestamp`. The id is the storage key and is
//! never part of the body.

use crate::error::{Error, Result, StoreError};
use crate::json::{get_at_path, JsonPath, PathSegment};
use crate::types::{now_millis, DocId, DocType};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Body field holding the type tag
pub const TYPE_FIELD: &str = "type";
/// Body field holding the server timestamp
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Row field holding the id in query results
pub const ID_FIELD: &str = "id";

/// Fields the server owns; caller-supplied values are discarded
pub const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, TYPE_FIELD, TIMESTAMP_FIELD];

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Storage key, assigned once at insert
    pub id: DocId,
    /// Type tag
    pub doc_type: DocType,
    /// Milliseconds since epoch, assigned by the server at creation
    pub timestamp: i64,
    /// Caller payload without reserved fields
    pub payload: Map<String, Value>,
}

impl Document {
    /// Build a new document from a caller payload
    ///
    /// The payload must be a JSON object. Any `id`, `type` or `timestamp`
    /// keys in it are dropped and replaced by server-assigned values.
    pub fn new(id: DocId, doc_type: DocType, payload: Value) -> Result<Self> {
        let Value::Object(mut payload) = payload else {
            return Err(Error::validation("document payload must be a JSON object"));
        };
        for field in RESERVED_FIELDS {
            payload.remove(field);
        }
        Ok(Document {
            id,
            doc_type,
            timestamp: now_millis(),
            payload,
        })
    }

    /// Rebuild a document from a stored body
    pub fn from_body(id: DocId, body: Value) -> Result<Self> {
        let Value::Object(mut payload) = body else {
            return Err(StoreError::internal(format!("document {} is not a JSON object", id)).into());
        };
        let doc_type = payload
            .remove(TYPE_FIELD)
            .and_then(|v| v.as_str().and_then(|s| s.parse::<DocType>().ok()))
            .ok_or_else(|| StoreError::internal(format!("document {} has no valid type", id)))?;
        let timestamp = payload
            .remove(TIMESTAMP_FIELD)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| StoreError::internal(format!("document {} has no valid timestamp", id)))?;
        payload.remove(ID_FIELD);
        Ok(Document {
            id,
            doc_type,
            timestamp,
            payload,
        })
    }

    /// The flattened body written to the backing store
    pub fn to_body(&self) -> Value {
        let mut body = self.payload.clone();
        body.insert(TYPE_FIELD.to_string(), Value::from(self.doc_type.as_str()));
        body.insert(TIMESTAMP_FIELD.to_string(), Value::from(self.timestamp));
        Value::Object(body)
    }

    /// The body plus the id, as returned by listing queries
    pub fn to_row(&self) -> Value {
        let mut row = self.to_body();
        if let Value::Object(obj) = &mut row {
            obj.insert(ID_FIELD.to_string(), Value::from(self.id.as_str()));
        }
        row
    }

    /// Read a payload field by path
    ///
    /// Reserved fields are not part of the payload and never match.
    pub fn field(&self, path: &JsonPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        get_at_path(self.payload.get(key)?, &JsonPath::from_segments(rest.to_vec()))
    }

    /// Deserialize the row shape into a typed record
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.to_row()).map_err(|e| {
            Error::Store(StoreError::internal(format!(
                "document {} does not match the {} schema: {}",
                self.id, self.doc_type, e
            )))
        })
    }
}
