//! Fuzzy term matching

/// Largest edit distance honoured; larger requests are clamped
pub const MAX_FUZZINESS: u8 = 2;

/// Levenshtein distance between two strings, counted in characters
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Whether an indexed term matches a query term within `fuzziness` edits
pub fn term_matches(query_term: &str, indexed: &str, fuzziness: Option<u8>) -> bool {
    if query_term == indexed {
        return true;
    }
    let max = usize::from(fuzziness.unwrap_or(0).min(MAX_FUZZINESS));
    if max == 0 {
        return false;
    }
    let (ql, il) = (query_term.chars().count(), indexed.chars().count());
    if ql.abs_diff(il) > max {
        return false;
    }
    levenshtein(query_term, indexed) <= max
}
