//! Text tokenizer
//!
//! - Lowercase
//! - Split on non-alphanumeric characters
//! - Drop tokens shorter than 2 characters
//!
//! [`tokenize_with_offsets`] also reports where each token sits in the
//! original text, for term locations and highlighting.

use rustc_hash::FxHashSet;

/// A token with its position in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased term
    pub term: String,
    /// 1-based position among kept tokens
    pub pos: u32,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// Tokenize text into searchable terms
///
/// # Example
///
/// ```
/// use clinicdb_search::tokenizer::tokenize;
///
/// let tokens = tokenize("Persistent cough, mild FEVER");
/// assert_eq!(tokens, vec!["persistent", "cough", "mild", "fever"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with_offsets(text)
        .into_iter()
        .map(|t| t.term)
        .collect()
}

/// Tokenize and deduplicate, keeping first-seen order
///
/// ```
/// use clinicdb_search::tokenizer::tokenize_unique;
///
/// assert_eq!(tokenize_unique("flu Flu FLU"), vec!["flu"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Tokenize, keeping byte offsets into `text`
pub fn tokenize_with_offsets(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                push_token(text, s, idx, &mut tokens);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_token(text, s, text.len(), &mut tokens);
    }
    tokens
}

fn push_token(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    let raw = &text[start..end];
    if raw.chars().count() < 2 {
        return;
    }
    tokens.push(Token {
        term: raw.to_lowercase(),
        pos: tokens.len() as u32 + 1,
        start,
        end,
    });
}
