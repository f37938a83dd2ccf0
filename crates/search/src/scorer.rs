//! Scoring
//!
//! This module provides:
//! - Scorer trait for pluggable scoring algorithms
//! - ScorerContext for corpus-level statistics
//! - SearchDoc, the per-document term counts a scorer sees
//! - BM25LiteScorer default implementation

use rustc_hash::FxHashMap;

// ============================================================================
// SearchDoc
// ============================================================================

/// Term statistics for one candidate document
///
/// Built while matching, never stored.
#[derive(Debug, Clone, Default)]
pub struct SearchDoc {
    /// Tokens across every indexed field
    pub len: usize,
    /// Query term -> occurrences matched (fuzzy matches included)
    pub term_freqs: FxHashMap<String, usize>,
}

impl SearchDoc {
    /// Create an empty SearchDoc
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of a query term
    pub fn add_match(&mut self, query_term: &str) {
        *self.term_freqs.entry(query_term.to_string()).or_insert(0) += 1;
    }

    /// Whether any query term matched
    pub fn has_matches(&self) -> bool {
        !self.term_freqs.is_empty()
    }
}

// ============================================================================
// ScorerContext
// ============================================================================

/// Corpus-level statistics for one query
#[derive(Debug, Clone, Default)]
pub struct ScorerContext {
    /// Documents in the index
    pub total_docs: usize,
    /// Documents containing each query term
    pub doc_freqs: FxHashMap<String, usize>,
    /// Average document length in tokens
    pub avg_doc_len: f32,
}

impl ScorerContext {
    /// Create a new ScorerContext
    pub fn new(total_docs: usize) -> Self {
        ScorerContext {
            total_docs,
            ..Self::default()
        }
    }

    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
    pub fn idf(&self, term: &str) -> f32 {
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
        let n = self.total_docs as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Count one more document containing `term`
    pub fn add_doc_freq(&mut self, term: &str) {
        *self.doc_freqs.entry(term.to_string()).or_insert(0) += 1;
    }

    /// Set average document length
    pub fn with_avg_doc_len(mut self, len: f32) -> Self {
        self.avg_doc_len = len;
        self
    }
}

// ============================================================================
// Scorer Trait
// ============================================================================

/// Pluggable scoring interface
///
/// Higher scores indicate more relevant documents.
pub trait Scorer: Send + Sync {
    /// Score a document against the query terms
    fn score(&self, doc: &SearchDoc, query_terms: &[String], ctx: &ScorerContext) -> f32;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// BM25LiteScorer
// ============================================================================

/// BM25-inspired scorer
///
/// For each query term t:
/// score += IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl/avgdl))
#[derive(Debug, Clone)]
pub struct BM25LiteScorer {
    /// Term frequency saturation
    k1: f32,
    /// Length normalization
    b: f32,
}

impl Default for BM25LiteScorer {
    fn default() -> Self {
        BM25LiteScorer { k1: 1.2, b: 0.75 }
    }
}

impl BM25LiteScorer {
    /// Create a scorer with custom parameters
    pub fn new(k1: f32, b: f32) -> Self {
        BM25LiteScorer { k1, b }
    }
}

impl Scorer for BM25LiteScorer {
    fn score(&self, doc: &SearchDoc, query_terms: &[String], ctx: &ScorerContext) -> f32 {
        if query_terms.is_empty() || doc.len == 0 {
            return 0.0;
        }
        let doc_len = doc.len as f32;
        let avg_len = ctx.avg_doc_len.max(1.0);

        query_terms
            .iter()
            .filter_map(|term| {
                let tf = *doc.term_freqs.get(term)? as f32;
                let norm = self.k1 * (1.0 - self.b + self.b * doc_len / avg_len);
                Some(ctx.idf(term) * (tf * (self.k1 + 1.0)) / (tf + norm))
            })
            .sum()
    }

    fn name(&self) -> &str {
        "bm25-lite"
    }
}
