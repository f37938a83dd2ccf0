//! Fragment highlighting

use clinicdb_core::HighlightStyle;

const ANSI_ON: &str = "\x1b[43m";
const ANSI_OFF: &str = "\x1b[0m";

fn markers(style: HighlightStyle) -> (&'static str, &'static str) {
    match style {
        HighlightStyle::Html => ("<mark>", "</mark>"),
        HighlightStyle::Ansi => (ANSI_ON, ANSI_OFF),
    }
}

/// Wrap each byte span of `text` in highlight markers
///
/// Spans must lie on char boundaries. Overlapping or unsorted spans are
/// merged first.
pub fn highlight(text: &str, spans: &[(usize, usize)], style: HighlightStyle) -> String {
    let (open, close) = markers(style);
    let mut sorted: Vec<(usize, usize)> = spans
        .iter()
        .copied()
        .filter(|(s, e)| s < e && *e <= text.len())
        .collect();
    sorted.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (s, e) in sorted {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }

    let mut out = String::with_capacity(text.len() + merged.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for (s, e) in merged {
        out.push_str(&text[cursor..s]);
        out.push_str(open);
        out.push_str(&text[s..e]);
        out.push_str(close);
        cursor = e;
    }
    out.push_str(&text[cursor..]);
    out
}
