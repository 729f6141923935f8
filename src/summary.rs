//! Summary (aggregate/total) row detection and flag management.
//!
//! Local detection runs four rules per row and stops at the first that
//! fires:
//!
//! 1. the first cell matches a known total/subtotal pattern,
//! 2. the first cell names a summary keyword and a cell in the totals span
//!    (columns 3 to 6 by default) carries an amount,
//! 3. the first cell mentions "total for group",
//! 4. the row text names a summary keyword and any cell carries an amount.
//!
//! [`resolve_detection`] prefers the remote detector's answer and falls back
//! to the local rules whenever it failed or found nothing.

use std::sync::OnceLock;

use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;

use crate::{
    config::{ColumnSpan, EditorConfig},
    data::looks_numeric_or_currency,
    error::EditResult,
    similarity::{contains_summary_keyword, find_similar_rows},
    table::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRule {
    FirstCellPattern,
    KeywordWithLeadingTotals,
    TotalForGroup,
    KeywordWithAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOutcome {
    pub rows: Vec<usize>,
    pub source: DetectionSource,
}

fn first_cell_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^total for group:?.*$",
            r"^subtotal:?.*$",
            r"^grand total:?.*$",
            r"^total:?.*$",
            r"^summary:?.*$",
            r"^group total:?.*$",
            r"^net total:?.*$",
            r"^[a-z\s]+\s+total$",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .unwrap_or_else(|err| panic!("invalid built-in pattern {pattern}: {err}"))
        })
        .collect()
    })
}

fn classify_row(row: &[String], span: ColumnSpan) -> Option<SummaryRule> {
    let first = row
        .first()
        .map(|cell| cell.trim().to_lowercase())
        .unwrap_or_default();

    if first_cell_patterns().iter().any(|re| re.is_match(&first)) {
        return Some(SummaryRule::FirstCellPattern);
    }

    let first_has_keyword = contains_summary_keyword(&first);
    if first_has_keyword
        && row
            .iter()
            .enumerate()
            .any(|(idx, cell)| span.contains(idx) && looks_numeric_or_currency(cell))
    {
        return Some(SummaryRule::KeywordWithLeadingTotals);
    }

    if first.contains("total for group") {
        return Some(SummaryRule::TotalForGroup);
    }

    let row_text = row.iter().map(|cell| cell.trim()).join(" ");
    if contains_summary_keyword(&row_text) && row.iter().any(|cell| looks_numeric_or_currency(cell))
    {
        return Some(SummaryRule::KeywordWithAmount);
    }

    None
}

/// Flagged rows with the rule that matched each, ascending by index.
pub fn detect_summary_rows_explained(
    table: &Table,
    config: &EditorConfig,
) -> Vec<(usize, SummaryRule)> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            classify_row(&row.cells, config.summary_numeric_columns).map(|rule| (idx, rule))
        })
        .inspect(|(idx, rule)| debug!("Row {idx} flagged as summary by {rule:?}"))
        .collect()
}

pub fn detect_summary_rows_locally(table: &Table, config: &EditorConfig) -> Vec<usize> {
    detect_summary_rows_explained(table, config)
        .into_iter()
        .map(|(idx, _)| idx)
        .collect()
}

/// Turns a remote detector's answer into the rows to flag; the local rules
/// run on any failure or empty answer.
pub fn resolve_detection(
    response: anyhow::Result<Vec<usize>>,
    table: &Table,
    config: &EditorConfig,
) -> DetectionOutcome {
    match response {
        Ok(rows) => {
            let mut valid = rows
                .into_iter()
                .filter(|&idx| {
                    let in_range = idx < table.row_count();
                    if !in_range {
                        warn!("Remote detector returned out-of-range row {idx}");
                    }
                    in_range
                })
                .collect::<Vec<_>>();
            valid.sort_unstable();
            valid.dedup();
            if !valid.is_empty() {
                info!("Remote detector flagged {} summary row(s)", valid.len());
                return DetectionOutcome {
                    rows: valid,
                    source: DetectionSource::Remote,
                };
            }
            info!("Remote detector found no summary rows; using local rules");
        }
        Err(err) => warn!("Remote summary detection failed: {err:#}; using local rules"),
    }
    DetectionOutcome {
        rows: detect_summary_rows_locally(table, config),
        source: DetectionSource::Local,
    }
}

/// Flags `row_idx` and every row similar to it. Returns the rows newly flagged.
pub fn mark_summary_row(table: &mut Table, row_idx: usize, threshold: f64) -> EditResult<Vec<usize>> {
    table.ensure_row(row_idx)?;
    let target = table.rows()[row_idx].cells.clone();
    let mut candidates = vec![row_idx];
    candidates.extend(find_similar_rows(table, &target, row_idx, threshold));
    candidates.sort_unstable();

    let mut added = Vec::new();
    for idx in candidates {
        if table.flag_summary_row(idx)? {
            added.push(idx);
        }
    }
    Ok(added)
}

/// Unflags a single row; similar rows stay flagged.
pub fn unmark_summary_row(table: &mut Table, row_idx: usize) -> EditResult<bool> {
    table.unflag_summary_row(row_idx)
}

/// Deletes every flagged row, highest index first, and returns how many went.
pub fn delete_summary_rows(table: &mut Table) -> usize {
    let indices = table.summary_row_indices();
    for &idx in indices.iter().rev() {
        table.remove_row(idx);
    }
    table.clear_summary_rows();
    indices.len()
}
