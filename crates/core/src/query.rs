//! Parameterized query statements
//!
//! Statements are values, not strings. Caller input only ever enters a
//! statement through [`Statement::bind`], and predicates compare bound
//! parameters against document fields structurally. [`Statement::render`]
//! produces a readable form with `$name` placeholders for logs.
//!
//! ```
//! use clinicdb_core::query::{Predicate, Statement};
//! use clinicdb_core::DocType;
//!
//! let stmt = Statement::select(DocType::Appointment)
//!     .filter(Predicate::eq("doctor", "id"))
//!     .bind("id", "0b7c...");
//!
//! assert_eq!(
//!     stmt.render("default"),
//!     "SELECT META().id, `default`.* FROM `default` WHERE type = 'appointment' AND doctor = $id"
//! );
//! ```

use crate::document::ID_FIELD;
use crate::error::{Result, StoreError};
use crate::json::{get_at_path, JsonPath, PathSegment};
use crate::types::DocType;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Named parameter values
pub type Params = BTreeMap<String, Value>;

// ============================================================================
// Predicate
// ============================================================================

/// Filter over a row (document body plus `id`)
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field = $param`
    Eq {
        /// Field path
        field: JsonPath,
        /// Parameter name
        param: String,
    },
    /// `META().id = $param`
    IdEq {
        /// Parameter name
        param: String,
    },
    /// `ANY x IN array SATISFIES x.field = $param END`
    ///
    /// True if at least one element of the array matches.
    Any {
        /// Array path
        array: JsonPath,
        /// Path inside each element
        field: JsonPath,
        /// Parameter name
        param: String,
    },
    /// Conjunction; an empty list is true
    And(Vec<Predicate>),
}

impl Predicate {
    /// Equality on a dotted field path
    pub fn eq(field: &str, param: &str) -> Self {
        Predicate::Eq {
            field: literal_path(field),
            param: param.to_string(),
        }
    }

    /// Equality on the document id
    pub fn id_eq(param: &str) -> Self {
        Predicate::IdEq {
            param: param.to_string(),
        }
    }

    /// Existential match over an array field
    pub fn any(array: &str, field: &str, param: &str) -> Self {
        Predicate::Any {
            array: literal_path(array),
            field: literal_path(field),
            param: param.to_string(),
        }
    }

    /// Evaluate against a row
    ///
    /// An unbound parameter is a query error, not a non-match.
    pub fn matches(&self, row: &Value, params: &Params) -> Result<bool> {
        match self {
            Predicate::Eq { field, param } => {
                let expected = lookup(params, param)?;
                Ok(get_at_path(row, field) == Some(expected))
            }
            Predicate::IdEq { param } => {
                let expected = lookup(params, param)?;
                Ok(row.get(ID_FIELD) == Some(expected))
            }
            Predicate::Any {
                array,
                field,
                param,
            } => {
                let expected = lookup(params, param)?;
                let Some(Value::Array(items)) = get_at_path(row, array) else {
                    return Ok(false);
                };
                Ok(items
                    .iter()
                    .any(|item| get_at_path(item, field) == Some(expected)))
            }
            Predicate::And(parts) => {
                for part in parts {
                    if !part.matches(row, params)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Parameter names this predicate references
    pub fn params(&self) -> Vec<&str> {
        match self {
            Predicate::Eq { param, .. }
            | Predicate::IdEq { param }
            | Predicate::Any { param, .. } => vec![param.as_str()],
            Predicate::And(parts) => parts.iter().flat_map(|p| p.params()).collect(),
        }
    }

    fn render(&self, alias: Option<&str>) -> String {
        let qualify = |path: &JsonPath| match alias {
            Some(a) => format!("{}.{}", a, path),
            None => path.to_string(),
        };
        match self {
            Predicate::Eq { field, param } => format!("{} = ${}", qualify(field), param),
            Predicate::IdEq { param } => match alias {
                Some(a) => format!("META({}).id = ${}", a, param),
                None => format!("META().id = ${}", param),
            },
            Predicate::Any {
                array,
                field,
                param,
            } => format!(
                "ANY x IN {} SATISFIES x.{} = ${} END",
                qualify(array),
                field,
                param
            ),
            Predicate::And(parts) => parts
                .iter()
                .map(|p| p.render(alias))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

/// Dotted key path written by the statement builder
fn literal_path(path: &str) -> JsonPath {
    JsonPath::from_segments(
        path.split('.')
            .filter(|k| !k.is_empty())
            .map(|k| PathSegment::Key(k.to_string()))
            .collect(),
    )
}

fn lookup<'a>(params: &'a Params, name: &str) -> Result<&'a Value> {
    params
        .get(name)
        .ok_or_else(|| StoreError::query(format!("unbound parameter ${}", name)).into())
}

// ============================================================================
// Source and Projection
// ============================================================================

/// Where rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Every document of a type
    Type(DocType),
    /// Key join: for each `parent` document passing the filter, every id
    /// listed at `via` that resolves to a `child` document
    Join {
        /// Parent type (the filter applies here)
        parent: DocType,
        /// Path of the id list on the parent
        via: JsonPath,
        /// Child type (rows come from here)
        child: DocType,
    },
}

impl Source {
    /// Type of the rows this source yields
    pub fn row_type(&self) -> DocType {
        match self {
            Source::Type(t) => *t,
            Source::Join { child, .. } => *child,
        }
    }
}

/// Shape of each result row
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    /// Whole body plus `id`
    #[default]
    Document,
    /// Selected fields plus `id`; each is named by its last key
    Fields(Vec<JsonPath>),
}

impl Projection {
    /// Project a fields list from literal paths
    pub fn fields(paths: &[&str]) -> Self {
        Projection::Fields(paths.iter().map(|p| literal_path(p)).collect())
    }

    /// Apply to a row (body plus `id`)
    pub fn apply(&self, row: &Value) -> Value {
        match self {
            Projection::Document => row.clone(),
            Projection::Fields(paths) => {
                let mut out = Map::new();
                for path in paths {
                    let name = match path.segments().last() {
                        Some(PathSegment::Key(k)) => k.clone(),
                        _ => path.to_string(),
                    };
                    if let Some(v) = get_at_path(row, path) {
                        out.insert(name, v.clone());
                    }
                }
                if let Some(id) = row.get(ID_FIELD) {
                    out.insert(ID_FIELD.to_string(), id.clone());
                }
                Value::Object(out)
            }
        }
    }
}

// ============================================================================
// Statement
// ============================================================================

/// What a statement does with matching rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Return rows
    Select,
    /// Remove matching documents and return them
    Delete,
}

/// A parameterized statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Select or delete
    pub action: Action,
    /// Row source
    pub source: Source,
    /// Filter (on the parent for joins)
    pub filter: Option<Predicate>,
    /// Row shape
    pub projection: Projection,
    /// Bound parameters
    pub params: Params,
}

impl Statement {
    /// Select every document of a type
    pub fn select(doc_type: DocType) -> Self {
        Statement {
            action: Action::Select,
            source: Source::Type(doc_type),
            filter: None,
            projection: Projection::Document,
            params: Params::new(),
        }
    }

    /// Select child documents referenced by an id list on each parent
    pub fn join(parent: DocType, via: &str, child: DocType) -> Self {
        Statement {
            action: Action::Select,
            source: Source::Join {
                parent,
                via: literal_path(via),
                child,
            },
            filter: None,
            projection: Projection::Document,
            params: Params::new(),
        }
    }

    /// Delete documents of a type, returning them
    pub fn delete(doc_type: DocType) -> Self {
        Statement {
            action: Action::Delete,
            ..Self::select(doc_type)
        }
    }

    /// Builder: add a filter (conjoined with any existing one)
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(Predicate::And(mut parts)) => {
                parts.push(predicate);
                Predicate::And(parts)
            }
            Some(existing) => Predicate::And(vec![existing, predicate]),
        });
        self
    }

    /// Builder: set the projection
    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Builder: bind a named parameter
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Check that every referenced parameter is bound
    pub fn check_bound(&self) -> Result<()> {
        if let Some(filter) = &self.filter {
            for name in filter.params() {
                lookup(&self.params, name)?;
            }
        }
        Ok(())
    }

    /// Whether the filter accepts a row (no filter accepts everything)
    pub fn accepts(&self, row: &Value) -> Result<bool> {
        match &self.filter {
            Some(p) => p.matches(row, &self.params),
            None => Ok(true),
        }
    }

    /// Readable form for logs, with `$name` placeholders
    pub fn render(&self, bucket: &str) -> String {
        let select_list = |alias: Option<&str>| match (&self.projection, alias) {
            (Projection::Document, None) => format!("META().id, `{}`.*", bucket),
            (Projection::Document, Some(a)) => format!("META({a}).id, {a}.*", a = a),
            (Projection::Fields(paths), alias) => {
                let mut cols: Vec<String> = paths
                    .iter()
                    .map(|p| match alias {
                        Some(a) => format!("{}.{}", a, p),
                        None => p.to_string(),
                    })
                    .collect();
                cols.push(match alias {
                    Some(a) => format!("META({}).id", a),
                    None => "META().id".to_string(),
                });
                cols.join(", ")
            }
        };

        match &self.source {
            Source::Type(doc_type) => {
                let mut where_clause = format!("type = '{}'", doc_type);
                if let Some(filter) = &self.filter {
                    where_clause.push_str(" AND ");
                    where_clause.push_str(&filter.render(None));
                }
                match self.action {
                    Action::Select => format!(
                        "SELECT {} FROM `{}` WHERE {}",
                        select_list(None),
                        bucket,
                        where_clause
                    ),
                    Action::Delete => format!(
                        "DELETE FROM `{}` WHERE {} RETURNING *",
                        bucket, where_clause
                    ),
                }
            }
            Source::Join { parent, via, child } => {
                let mut where_clause = format!("p.type = '{}'", parent);
                if let Some(filter) = &self.filter {
                    where_clause.push_str(" AND ");
                    where_clause.push_str(&filter.render(Some("p")));
                }
                format!(
                    "SELECT {} FROM `{b}` AS p JOIN `{b}` AS c ON KEYS p.{} WHERE {} AND c.type = '{}'",
                    select_list(Some("c")),
                    via,
                    where_clause,
                    child,
                    b = bucket
                )
            }
        }
    }
}
