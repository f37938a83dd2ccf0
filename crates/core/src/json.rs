//! JSON paths over document bodies
//!
//! Documents are plain `serde_json::Value` objects. This module provides a
//! small path type used by statements (`information.firstname`), partial
//! mutations (`patients`, `notes`) and the search substitute
//! (`notes.message`, which fans out over every element of `notes`).
//!
//! # Path Syntax (Subset)
//!
//! | Syntax | Meaning | Example |
//! |--------|---------|---------|
//! | `key` | Object property | `department` |
//! | `a.b` | Nested property | `information.lastname` |
//! | `a[n]` | Property then index | `notes[0]` |
//! | (empty) | Root | `` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of segments in a path
pub const MAX_PATH_LENGTH: usize = 64;

// =============================================================================
// JsonPath and PathSegment
// =============================================================================

/// Error type for JSON path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// Too many segments
    #[error("path has {0} segments, maximum is {max}", max = MAX_PATH_LENGTH)]
    TooLong(usize),
}

/// A segment in a JSON path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
}

/// A path into a JSON document
///
/// # Examples
///
/// ```
/// use clinicdb_core::json::JsonPath;
///
/// let path: JsonPath = "information.firstname".parse().unwrap();
/// assert_eq!(path, JsonPath::root().key("information").key("firstname"));
/// assert_eq!(path.to_string(), "information.firstname");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        JsonPath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Builder: append a key segment
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Builder: append an index segment
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Convert to a string representation
    pub fn to_path_string(&self) -> String {
        let mut result = String::new();
        for seg in &self.segments {
            match seg {
                PathSegment::Key(k) => {
                    if !result.is_empty() {
                        result.push('.');
                    }
                    result.push_str(k);
                }
                PathSegment::Index(i) => {
                    result.push('[');
                    result.push_str(&i.to_string());
                    result.push(']');
                }
            }
        }
        result
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(JsonPath::root());
        }

        let mut segments = Vec::new();
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        if chars[0] == '.' {
            i += 1;
        }

        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() || chars[i] == '.' {
                    return Err(PathParseError::EmptyKey(i));
                }
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }
                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;
                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                segments.push(PathSegment::Key(chars[key_start..i].iter().collect()));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        if segments.len() > MAX_PATH_LENGTH {
            return Err(PathParseError::TooLong(segments.len()));
        }
        Ok(JsonPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

// =============================================================================
// Path Operations
// =============================================================================

/// Error type for path operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonPathError {
    /// Type mismatch during path traversal
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Path prefix where the mismatch happened
        path: String,
        /// Expected type
        expected: &'static str,
        /// Actual type found
        found: &'static str,
    },

    /// Array index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The array length
        len: usize,
    },
}

/// Get the value at an exact path
///
/// Returns `None` when any segment is missing or the shape does not match.
pub fn get_at_path<'a>(value: &'a Value, path: &JsonPath) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Key(key) => current.as_object()?.get(key)?,
            PathSegment::Index(idx) => current.as_array()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Collect every value reachable at a path, fanning out over arrays
///
/// When a key segment meets an array, the remaining path is applied to
/// each element. `notes.message` on a patient yields every note's message.
/// A path that ends on an array yields the array itself.
pub fn collect_at_path<'a>(value: &'a Value, path: &JsonPath) -> Vec<&'a Value> {
    let mut out = Vec::new();
    collect_recursive(value, path.segments(), &mut out);
    out
}

fn collect_recursive<'a>(value: &'a Value, segments: &[PathSegment], out: &mut Vec<&'a Value>) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match (first, value) {
        (PathSegment::Key(key), Value::Object(obj)) => {
            if let Some(child) = obj.get(key) {
                collect_recursive(child, rest, out);
            }
        }
        (PathSegment::Key(_), Value::Array(items)) => {
            for item in items {
                collect_recursive(item, segments, out);
            }
        }
        (PathSegment::Index(idx), Value::Array(items)) => {
            if let Some(child) = items.get(*idx) {
                collect_recursive(child, rest, out);
            }
        }
        _ => {}
    }
}

/// Get a mutable array at a path, creating missing objects and the array
///
/// Intermediate keys that do not exist are created as objects; a missing
/// final key is created as an empty array. Existing values of the wrong
/// shape are a `TypeMismatch`.
pub fn array_at_path_mut<'a>(
    root: &'a mut Value,
    path: &JsonPath,
) -> Result<&'a mut Vec<Value>, JsonPathError> {
    let segments = path.segments();
    let mut current = root;

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        let prefix = || JsonPath::from_segments(segments[..=i].to_vec()).to_path_string();
        current = match segment {
            PathSegment::Key(key) => {
                let found = value_type_name(current);
                let obj = current.as_object_mut().ok_or_else(|| JsonPathError::TypeMismatch {
                    path: prefix(),
                    expected: "object",
                    found,
                })?;
                obj.entry(key.clone()).or_insert_with(|| {
                    if is_last {
                        Value::Array(Vec::new())
                    } else {
                        Value::Object(Map::new())
                    }
                })
            }
            PathSegment::Index(idx) => {
                let found = value_type_name(current);
                let arr = current.as_array_mut().ok_or_else(|| JsonPathError::TypeMismatch {
                    path: prefix(),
                    expected: "array",
                    found,
                })?;
                let len = arr.len();
                arr.get_mut(*idx)
                    .ok_or(JsonPathError::IndexOutOfBounds { index: *idx, len })?
            }
        };
    }

    let found = value_type_name(current);
    current.as_array_mut().ok_or_else(|| JsonPathError::TypeMismatch {
        path: path.to_path_string(),
        expected: "array",
        found,
    })
}

/// Type name for error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
