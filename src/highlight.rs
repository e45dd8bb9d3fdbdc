//! Query-term highlighting.
//!
//! Splits the raw query on whitespace, escapes each token, and marks every
//! case-insensitive, non-overlapping occurrence of any token in the value.
//! The scanner is greedy left-to-right; zero-length matches are skipped so a
//! degenerate pattern can never stall. Unmatched text is preserved verbatim,
//! so concatenating the spans always reproduces the input.

use regex::RegexBuilder;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub highlighted: bool,
}

fn plain(value: &str) -> Vec<Span> {
    if value.is_empty() {
        return Vec::new();
    }
    vec![Span {
        text: value.to_string(),
        highlighted: false,
    }]
}

/// Split `value` into highlighted and plain spans for `query`.
pub fn highlight(value: &str, query: &str) -> Vec<Span> {
    let trimmed = query.trim();
    if value.is_empty() || trimmed.is_empty() {
        return plain(value);
    }

    let pattern = trimmed
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(_) => return plain(value),
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for m in re.find_iter(value) {
        if m.start() == m.end() {
            continue;
        }
        if m.start() > last {
            spans.push(Span {
                text: value[last..m.start()].to_string(),
                highlighted: false,
            });
        }
        spans.push(Span {
            text: m.as_str().to_string(),
            highlighted: true,
        });
        last = m.end();
    }
    if last < value.len() {
        spans.push(Span {
            text: value[last..].to_string(),
            highlighted: false,
        });
    }
    spans
}

/// Render `value` with each match wrapped in `open`/`close` markers.
pub fn mark(value: &str, query: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for span in highlight(value, query) {
        if span.highlighted {
            out.push_str(open);
            out.push_str(&span.text);
            out.push_str(close);
        } else {
            out.push_str(&span.text);
        }
    }
    out
}
