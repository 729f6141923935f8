//! Row similarity scoring and summary-context heuristics.
//!
//! Similarity is a coarse per-column equality ratio rather than an edit
//! distance: rows that should be grouped with a summary line are expected to
//! be near-duplicates of it.

use std::collections::BTreeSet;

use log::debug;

use crate::table::Table;

pub const SUMMARY_KEYWORDS: &[&str] = &[
    "total",
    "subtotal",
    "summary",
    "group",
    "grand",
    "sum",
    "count",
    "amount",
    "balance",
    "net",
    "final",
    "overall",
    "combined",
    "aggregate",
];

const SUMMARY_CONTEXT_CELLS: usize = 3;

const SHARED_PREFIXES: &[&str] = &["total for group", "total:", "subtotal", "summary"];

fn normalize(cell: &str) -> String {
    cell.trim().to_lowercase()
}

pub fn similarity(row_a: &[String], row_b: &[String]) -> f64 {
    if row_a.len() != row_b.len() || row_a.is_empty() {
        return 0.0;
    }
    let matches = row_a
        .iter()
        .zip(row_b)
        .filter(|(a, b)| normalize(a) == normalize(b))
        .count();
    matches as f64 / row_a.len() as f64
}

fn names_keyword(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some(rest) => matches!(rest, "" | "s" | "es"),
        None => false,
    }
}

/// Keywords appearing as words in `text`; plural forms ("totals") count.
pub fn keywords_in(text: &str) -> BTreeSet<&'static str> {
    let lowered = text.to_lowercase();
    let words = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>();
    SUMMARY_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| words.iter().any(|word| names_keyword(word, keyword)))
        .collect()
}

pub fn contains_summary_keyword(text: &str) -> bool {
    !keywords_in(text).is_empty()
}

pub fn is_likely_summary_context(row: &[String]) -> bool {
    row.iter()
        .take(SUMMARY_CONTEXT_CELLS)
        .any(|cell| contains_summary_keyword(&normalize(cell)))
}

fn first_cell(row: &[String]) -> String {
    row.first().map(|cell| normalize(cell)).unwrap_or_default()
}

fn shares_summary_pattern(target: &[String], candidate: &[String]) -> bool {
    let target_first = first_cell(target);
    let candidate_first = first_cell(candidate);
    if SHARED_PREFIXES
        .iter()
        .any(|prefix| target_first.starts_with(prefix) && candidate_first.starts_with(prefix))
    {
        return true;
    }
    let target_keywords = keywords_in(&target_first);
    target_keywords.len() == 1 && target_keywords == keywords_in(&candidate_first)
}

/// Rows that should be flagged together with `target_row`, in table order.
pub fn find_similar_rows(
    table: &Table,
    target_row: &[String],
    target_row_idx: usize,
    threshold: f64,
) -> Vec<usize> {
    let summary_context = is_likely_summary_context(target_row);
    let similar = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != target_row_idx)
        .filter(|(_, row)| {
            if summary_context {
                is_likely_summary_context(&row.cells) && shares_summary_pattern(target_row, &row.cells)
            } else {
                similarity(target_row, &row.cells) >= threshold
            }
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    debug!(
        "Row {} ({}) matched {} similar row(s)",
        target_row_idx,
        if summary_context { "summary context" } else { "generic" },
        similar.len()
    );
    similar
}
