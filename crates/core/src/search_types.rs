//! Full-text search contract
//!
//! The store does not score or index text itself. It hands a
//! [`SearchQuery`] to a [`SearchService`](crate::traits::SearchService)
//! and returns its [`SearchResponse`] unchanged. These types fix the
//! request and response shape:
//! - SearchQuery: index name, match text, optional fuzziness, fields to
//!   surface, highlight style and fields
//! - SearchHit: score, term locations, highlighted fragments, field values
//! - SearchResponse: hits ordered by descending score

use crate::types::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highlight markup style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    /// `<mark>term</mark>`
    #[default]
    Html,
    /// ANSI inverse video
    Ansi,
}

/// Highlight request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Markup style
    pub style: HighlightStyle,
    /// Fields to build fragments for (empty = every matched field)
    pub fields: Vec<String>,
}

/// A match query against a named index
///
/// # Examples
///
/// ```
/// use clinicdb_core::{HighlightStyle, SearchQuery};
///
/// let q = SearchQuery::new("medical-condition", "fever")
///     .with_fuzziness(1)
///     .with_fields(["information.firstname", "notes.message"])
///     .with_highlight(HighlightStyle::Html, ["notes.message"]);
///
/// assert_eq!(q.fuzziness, Some(1));
/// assert_eq!(q.fields.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Index to query
    pub index: String,
    /// Match text
    pub text: String,
    /// Maximum edit distance for a term to count as matching
    pub fuzziness: Option<u8>,
    /// Stored fields to return with each hit
    pub fields: Vec<String>,
    /// Optional highlighting
    pub highlight: Option<Highlight>,
    /// Maximum hits to return
    pub limit: usize,
}

impl SearchQuery {
    /// Default hit limit
    pub const DEFAULT_LIMIT: usize = 10;

    /// Create a match query with defaults (exact terms, no fields, no highlight)
    pub fn new(index: impl Into<String>, text: impl Into<String>) -> Self {
        SearchQuery {
            index: index.into(),
            text: text.into(),
            fuzziness: None,
            fields: Vec::new(),
            highlight: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Builder: set fuzziness
    pub fn with_fuzziness(mut self, distance: u8) -> Self {
        self.fuzziness = Some(distance);
        self
    }

    /// Builder: set fields to surface
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: request highlighting
    pub fn with_highlight<I, S>(mut self, style: HighlightStyle, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight = Some(Highlight {
            style,
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Builder: set hit limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Position of one term occurrence inside a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Token position (1-based) within the field
    pub pos: u32,
    /// Byte offset of the first character
    pub start: u32,
    /// Byte offset one past the last character
    pub end: u32,
    /// Element index when the field fans out over an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_position: Option<u32>,
}

/// field -> matched term -> occurrences
pub type Locations = BTreeMap<String, BTreeMap<String, Vec<Location>>>;

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Index that produced the hit
    pub index: String,
    /// Matching document id
    pub id: DocId,
    /// Relevance score (higher = more relevant)
    pub score: f32,
    /// Where the query terms matched
    pub locations: Locations,
    /// Highlighted fragments per field
    pub fragments: BTreeMap<String, Vec<String>>,
    /// Requested field values
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Result of a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits ordered by descending score
    pub hits: Vec<SearchHit>,
    /// Number of matching documents before the limit was applied
    pub total_hits: usize,
    /// Highest score (0.0 when empty)
    pub max_score: f32,
    /// Execution time (microseconds)
    pub took_micros: u64,
}

impl SearchResponse {
    /// Whether there are no hits
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of hits returned
    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
