//! In-process search service
//!
//! [`LocalSearch`] answers match queries by scanning the backend at query
//! time. Nothing is indexed ahead of time, so a document is searchable as
//! soon as its write returns.
//!
//! An index is a named [`IndexDefinition`]: the document type it covers
//! and the text fields it analyzes. Field paths fan out over arrays, so
//! `notes.message` covers every note of a patient and reports which
//! element matched through `array_position`.

use crate::fuzzy::term_matches;
use crate::highlight::highlight;
use crate::scorer::{BM25LiteScorer, Scorer, ScorerContext, SearchDoc};
use crate::tokenizer::{tokenize_unique, tokenize_with_offsets};
use clinicdb_core::document::TYPE_FIELD;
use clinicdb_core::error::codes;
use clinicdb_core::json::collect_at_path;
use clinicdb_core::{
    Backend, DocId, DocType, Error, JsonPath, Location, Locations, PathSegment, Result,
    SearchHit, SearchQuery, SearchResponse, SearchService, StoreError,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A named full-text index over one document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Index name used in queries
    pub name: String,
    /// Documents covered
    pub doc_type: DocType,
    /// Dotted paths of the analyzed text fields
    pub fields: Vec<String>,
}

impl IndexDefinition {
    /// Create an index definition
    pub fn new<I, S>(name: impl Into<String>, doc_type: DocType, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexDefinition {
            name: name.into(),
            doc_type,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledIndex {
    definition: IndexDefinition,
    paths: Vec<(String, JsonPath)>,
}

/// One analyzed field value that matched
#[derive(Debug)]
struct MatchedValue {
    array_position: Option<u32>,
    text: String,
    spans: Vec<(usize, usize)>,
}

#[derive(Debug, Default)]
struct Analysis {
    doc: SearchDoc,
    locations: Locations,
    matched: BTreeMap<String, Vec<MatchedValue>>,
}

/// Scan-based [`SearchService`] over a [`Backend`]
pub struct LocalSearch {
    backend: Arc<dyn Backend>,
    indexes: RwLock<FxHashMap<String, CompiledIndex>>,
    scorer: Box<dyn Scorer>,
}

impl std::fmt::Debug for LocalSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSearch")
            .field("indexes", &self.index_names())
            .field("scorer", &self.scorer.name())
            .finish()
    }
}

impl LocalSearch {
    /// Create a service with no indexes and the BM25-lite scorer
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        LocalSearch {
            backend,
            indexes: RwLock::new(FxHashMap::default()),
            scorer: Box::new(BM25LiteScorer::default()),
        }
    }

    /// Builder: replace the scorer
    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Register an index, replacing any index of the same name
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the definition has no fields or a field path
    /// does not parse.
    pub fn register_index(&self, definition: IndexDefinition) -> Result<()> {
        if definition.fields.is_empty() {
            return Err(Error::validation(format!(
                "index {} has no fields",
                definition.name
            )));
        }
        let paths = definition
            .fields
            .iter()
            .map(|field| {
                field
                    .parse::<JsonPath>()
                    .map(|path| (field.clone(), path))
                    .map_err(|e| Error::validation(format!("index field {}: {}", field, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            target: "clinicdb::search",
            index = %definition.name,
            doc_type = %definition.doc_type,
            fields = definition.fields.len(),
            "registered search index"
        );
        self.indexes.write().insert(
            definition.name.clone(),
            CompiledIndex { definition, paths },
        );
        Ok(())
    }

    /// Remove an index; returns whether it existed
    pub fn drop_index(&self, name: &str) -> bool {
        self.indexes.write().remove(name).is_some()
    }

    /// Definition of a registered index
    pub fn index(&self, name: &str) -> Option<IndexDefinition> {
        self.indexes.read().get(name).map(|c| c.definition.clone())
    }

    /// Names of registered indexes, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn analyze(
        &self,
        index: &CompiledIndex,
        body: &Value,
        terms: &[String],
        fuzziness: Option<u8>,
    ) -> Analysis {
        let mut analysis = Analysis::default();

        for (field, path) in &index.paths {
            let mut texts = Vec::new();
            field_texts(body, path.segments(), None, &mut texts);

            for (array_position, text) in texts {
                let tokens = tokenize_with_offsets(text);
                analysis.doc.len += tokens.len();
                let mut spans = Vec::new();

                for token in &tokens {
                    let Some(query_term) = terms
                        .iter()
                        .find(|q| term_matches(q, &token.term, fuzziness))
                    else {
                        continue;
                    };
                    analysis.doc.add_match(query_term);
                    spans.push((token.start, token.end));
                    analysis
                        .locations
                        .entry(field.clone())
                        .or_default()
                        .entry(token.term.clone())
                        .or_default()
                        .push(Location {
                            pos: token.pos,
                            start: token.start as u32,
                            end: token.end as u32,
                            array_position,
                        });
                }

                if !spans.is_empty() {
                    analysis
                        .matched
                        .entry(field.clone())
                        .or_default()
                        .push(MatchedValue {
                            array_position,
                            text: text.to_string(),
                            spans,
                        });
                }
            }
        }
        analysis
    }
}

/// Collect string values at a path, noting the array element they came from
fn field_texts<'a>(
    value: &'a Value,
    segments: &[PathSegment],
    array_position: Option<u32>,
    out: &mut Vec<(Option<u32>, &'a str)>,
) {
    let Some((first, rest)) = segments.split_first() else {
        match value {
            Value::String(s) => out.push((array_position, s.as_str())),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::String(s) = item {
                        out.push((array_position.or(Some(i as u32)), s.as_str()));
                    }
                }
            }
            _ => {}
        }
        return;
    };
    match (first, value) {
        (PathSegment::Key(key), Value::Object(obj)) => {
            if let Some(child) = obj.get(key) {
                field_texts(child, rest, array_position, out);
            }
        }
        (PathSegment::Key(_), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                field_texts(item, segments, array_position.or(Some(i as u32)), out);
            }
        }
        (PathSegment::Index(idx), Value::Array(items)) => {
            if let Some(child) = items.get(*idx) {
                field_texts(child, rest, array_position, out);
            }
        }
        _ => {}
    }
}

/// Stored value for a requested field: a single value, or an array when
/// the path fans out
fn field_value(body: &Value, path: &JsonPath) -> Option<Value> {
    let mut values = collect_at_path(body, path);
    match values.len() {
        0 => None,
        1 => values.pop().cloned(),
        _ => Some(Value::Array(values.into_iter().cloned().collect())),
    }
}

impl SearchService for LocalSearch {
    fn query(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let started = Instant::now();
        let index = self.indexes.read().get(&query.index).cloned().ok_or_else(|| {
            StoreError::new(
                codes::SEARCH_INDEX_NOT_FOUND,
                format!("search index not found: {}", query.index),
            )
        })?;

        let requested_fields = query
            .fields
            .iter()
            .map(|field| {
                field
                    .parse::<JsonPath>()
                    .map(|path| (field.clone(), path))
                    .map_err(|e| Error::from(StoreError::query(format!("field {}: {}", field, e))))
            })
            .collect::<Result<Vec<_>>>()?;

        let terms = tokenize_unique(&query.text);
        if terms.is_empty() {
            return Ok(SearchResponse {
                took_micros: started.elapsed().as_micros() as u64,
                ..SearchResponse::default()
            });
        }

        let mut ctx = ScorerContext::new(0);
        let mut total_len = 0usize;
        let mut candidates = Vec::new();

        for (id, versioned) in self.backend.scan()? {
            let body = versioned.value;
            if body.get(TYPE_FIELD).and_then(Value::as_str) != Some(index.definition.doc_type.as_str())
            {
                continue;
            }
            ctx.total_docs += 1;
            let analysis = self.analyze(&index, &body, &terms, query.fuzziness);
            total_len += analysis.doc.len;
            if analysis.doc.has_matches() {
                for term in analysis.doc.term_freqs.keys() {
                    ctx.add_doc_freq(term);
                }
                candidates.push((id, body, analysis));
            }
        }
        if ctx.total_docs > 0 {
            ctx.avg_doc_len = total_len as f32 / ctx.total_docs as f32;
        }

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|(id, body, analysis)| {
                let score = self.scorer.score(&analysis.doc, &terms, &ctx);
                build_hit(&index.definition.name, id, &body, score, analysis, query, &requested_fields)
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        let total_hits = hits.len();
        let max_score = hits.first().map(|h| h.score).unwrap_or(0.0);
        hits.truncate(query.limit);

        debug!(
            target: "clinicdb::search",
            index = %query.index,
            terms = terms.len(),
            scanned = ctx.total_docs,
            total_hits,
            "search"
        );

        Ok(SearchResponse {
            hits,
            total_hits,
            max_score,
            took_micros: started.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn build_hit(
    index: &str,
    id: DocId,
    body: &Value,
    score: f32,
    analysis: Analysis,
    query: &SearchQuery,
    requested_fields: &[(String, JsonPath)],
) -> SearchHit {
    let mut fragments = BTreeMap::new();
    if let Some(hl) = &query.highlight {
        for (field, values) in &analysis.matched {
            if !hl.fields.is_empty() && !hl.fields.contains(field) {
                continue;
            }
            let mut sorted: Vec<&MatchedValue> = values.iter().collect();
            sorted.sort_by_key(|v| v.array_position);
            let field_fragments = sorted
                .into_iter()
                .map(|v| highlight(&v.text, &v.spans, hl.style))
                .collect();
            fragments.insert(field.clone(), field_fragments);
        }
    }

    let fields = requested_fields
        .iter()
        .filter_map(|(name, path)| field_value(body, path).map(|v| (name.clone(), v)))
        .collect();

    SearchHit {
        index: index.to_string(),
        id,
        score,
        locations: analysis.locations,
        fragments,
        fields,
    }
}
