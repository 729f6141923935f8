//! Reference-row format validation and auto-correction.
//!
//! A user picks a "known good" row; every other row is checked cell by cell
//! against the data types found in it. Mismatching cells can be coerced
//! towards the expected type with [`correct_cell_value()`], which reports
//! whether it found a real value or had to fall back to a placeholder.
//!
//! [`FormatSession`] holds the reference-row workflow:
//! `NoReference -> ReferenceSet -> (correct) -> revalidate`, and back to
//! `NoReference` when the reference is cleared.

use std::{collections::BTreeMap, sync::OnceLock};

use chrono::NaiveDate;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{CURRENCY_SYMBOLS, DataType, classify},
    editor::Editor,
    error::{EditError, EditResult},
    remote::{CorrectedRow, RequestKind, RequestTicket, RowCorrectionRequest, RowCorrectionService},
    table::{RowId, Table},
};

pub const DEFAULT_CURRENCY: &str = "$0.00";
pub const DEFAULT_PERCENTAGE: &str = "0%";
pub const DEFAULT_DATE: &str = "01/01/2024";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Outcome of coercing one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// A value of the expected type was found in the cell.
    Corrected(String),
    /// Nothing usable was found; this is a stock default, not data.
    Placeholder(String),
    /// The cell has no value that fits the expected type.
    Unresolvable,
    /// Text (or empty) was expected, so the value stands.
    Unchanged,
}

impl Correction {
    pub fn into_value(self, current: &str) -> String {
        match self {
            Correction::Corrected(value) | Correction::Placeholder(value) => value,
            Correction::Unresolvable | Correction::Unchanged => current.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Correction::Placeholder(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCorrection {
    pub col_idx: usize,
    pub original: String,
    pub correction: Correction,
}

struct Extractors {
    number: Regex,
    slash_date: Regex,
    iso_date: Regex,
    dash_date: Regex,
}

fn extractors() -> &'static Extractors {
    static EXTRACTORS: OnceLock<Extractors> = OnceLock::new();
    EXTRACTORS.get_or_init(|| Extractors {
        number: compile(r"-?(?:\d[\d,]*(?:\.\d+)?|\.\d+)"),
        slash_date: compile(r"\b\d{1,2}/\d{1,2}/\d{4}\b"),
        iso_date: compile(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"),
        dash_date: compile(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b"),
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid built-in pattern {pattern}: {err}"))
}

fn cell_at(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

pub fn validate_row_format(reference_row: &[String], target_row: &[String]) -> FormatValidationResult {
    let mut issues = Vec::new();
    for idx in 0..reference_row.len().max(target_row.len()) {
        let reference = cell_at(reference_row, idx);
        if reference.trim().is_empty() {
            continue;
        }
        let target = cell_at(target_row, idx);
        let target_type = classify(target);
        if target_type == DataType::Empty {
            continue;
        }
        let reference_type = classify(reference);
        if reference_type != target_type {
            issues.push(format!(
                "Column {}: Expected {}, got {} ({})",
                idx + 1,
                reference_type,
                target_type,
                target
            ));
        }
    }
    FormatValidationResult {
        is_valid: issues.is_empty(),
        issues,
    }
}

fn first_number(value: &str) -> Option<(bool, String)> {
    let found = extractors().number.find(value)?;
    let text = found.as_str();
    let negative = text.starts_with('-')
        || (value.trim().starts_with('(') && value.trim().ends_with(')'));
    let digits = text.trim_start_matches('-');
    let digits = if digits.starts_with('.') {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    Some((negative, digits))
}

fn currency_symbol(reference: &str) -> char {
    reference
        .chars()
        .find(|c| CURRENCY_SYMBOLS.contains(c))
        .unwrap_or('$')
}

fn extract_date(value: &str) -> Option<String> {
    let ex = extractors();
    if let Some(found) = ex.slash_date.find(value) {
        return Some(found.as_str().to_string());
    }
    if let Some(caps) = ex.iso_date.captures(value) {
        let parsed = NaiveDate::parse_from_str(&caps[0], "%Y-%m-%d").ok();
        if let Some(date) = parsed {
            return Some(date.format("%m/%d/%Y").to_string());
        }
    }
    if let Some(caps) = ex.dash_date.captures(value) {
        return Some(format!("{}/{}/{}", &caps[1], &caps[2], &caps[3]));
    }
    None
}

/// Coerces `current_value` towards `expected_type`. Never fails.
pub fn correct_cell_value(current_value: &str, expected_type: DataType, reference_value: &str) -> Correction {
    match expected_type {
        DataType::Number => match first_number(current_value) {
            Some((negative, digits)) => {
                let plain = digits.replace(',', "");
                Correction::Corrected(if negative { format!("-{plain}") } else { plain })
            }
            None => Correction::Unresolvable,
        },
        DataType::Currency => match first_number(current_value) {
            Some((negative, digits)) => {
                let symbol = currency_symbol(reference_value);
                Correction::Corrected(if negative {
                    format!("({symbol}{digits})")
                } else {
                    format!("{symbol}{digits}")
                })
            }
            None => Correction::Placeholder(DEFAULT_CURRENCY.to_string()),
        },
        // Percentages are unsigned, so a negative source is left for the user.
        DataType::Percentage => match first_number(current_value) {
            Some((true, _)) => Correction::Unresolvable,
            Some((false, digits)) => Correction::Corrected(format!("{}%", digits.replace(',', ""))),
            None => Correction::Placeholder(DEFAULT_PERCENTAGE.to_string()),
        },
        DataType::Date => match extract_date(current_value) {
            Some(date) => Correction::Corrected(date),
            None => Correction::Placeholder(DEFAULT_DATE.to_string()),
        },
        DataType::Text | DataType::Empty => Correction::Unchanged,
    }
}

/// Per-cell corrections for every mismatching, non-empty target cell.
pub fn correct_row_format_detailed(reference_row: &[String], target_row: &[String]) -> Vec<CellCorrection> {
    let mut corrections = Vec::new();
    for (idx, target) in target_row.iter().enumerate() {
        let reference = cell_at(reference_row, idx);
        if reference.trim().is_empty() {
            continue;
        }
        let target_type = classify(target);
        if target_type == DataType::Empty {
            continue;
        }
        let expected = classify(reference);
        if expected == target_type {
            continue;
        }
        let correction = correct_cell_value(target, expected, reference);
        let changed = match &correction {
            Correction::Corrected(value) | Correction::Placeholder(value) => value != target,
            Correction::Unresolvable | Correction::Unchanged => false,
        };
        if changed {
            corrections.push(CellCorrection {
                col_idx: idx,
                original: target.clone(),
                correction,
            });
        }
    }
    corrections
}

/// Corrected copy of `target_row`, or `None` when nothing needed changing.
pub fn correct_row_format(reference_row: &[String], target_row: &[String]) -> Option<Vec<String>> {
    let corrections = correct_row_format_detailed(reference_row, target_row);
    if corrections.is_empty() {
        return None;
    }
    let mut corrected = target_row.to_vec();
    for cell in corrections {
        corrected[cell.col_idx] = cell.correction.into_value(&cell.original);
    }
    Some(corrected)
}

/// Validation of every row except the reference and flagged summary rows.
pub fn validate_all_rows_format(
    table: &Table,
    reference_idx: usize,
) -> BTreeMap<usize, FormatValidationResult> {
    let Some(reference) = table.row(reference_idx) else {
        return BTreeMap::new();
    };
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != reference_idx && !table.is_summary_row(*idx))
        .map(|(idx, row)| (idx, validate_row_format(reference, &row.cells)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionSource {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionReport {
    pub corrected_rows: Vec<usize>,
    /// `(row, column)` cells that received a stock default instead of a real value.
    pub placeholders: Vec<(usize, usize)>,
    pub source: CorrectionSource,
}

impl CorrectionReport {
    fn nothing(source: CorrectionSource) -> Self {
        Self {
            corrected_rows: Vec::new(),
            placeholders: Vec::new(),
            source,
        }
    }
}

/// A correction request handed to the remote corrector and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCorrection {
    ticket: RequestTicket,
    table_idx: usize,
    reference_idx: usize,
    pub reference: Vec<String>,
    pub header: Vec<String>,
    pub requests: Vec<RowCorrectionRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub table_idx: usize,
    row_id: RowId,
    pub row_idx: usize,
    pub cells: Vec<String>,
    pub results: BTreeMap<usize, FormatValidationResult>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormatSession {
    #[default]
    NoReference,
    ReferenceSet(ReferenceRow),
}

impl FormatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(&self) -> Option<&ReferenceRow> {
        match self {
            FormatSession::NoReference => None,
            FormatSession::ReferenceSet(reference) => Some(reference),
        }
    }

    fn reference_or_err(&self) -> EditResult<&ReferenceRow> {
        self.reference().ok_or(EditError::NoReferenceRow)
    }

    pub fn results(&self) -> Option<&BTreeMap<usize, FormatValidationResult>> {
        self.reference().map(|reference| &reference.results)
    }

    pub fn result_for(&self, row_idx: usize) -> Option<&FormatValidationResult> {
        self.results().and_then(|results| results.get(&row_idx))
    }

    pub fn invalid_rows(&self) -> Vec<usize> {
        self.results()
            .map(|results| {
                results
                    .iter()
                    .filter(|(_, result)| !result.is_valid)
                    .map(|(idx, _)| *idx)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Makes `row_idx` the reference and validates every other row against it.
    pub fn set_reference(&mut self, table: &Table, table_idx: usize, row_idx: usize) -> EditResult<()> {
        table.ensure_row(row_idx)?;
        let row = &table.rows()[row_idx];
        let results = validate_all_rows_format(table, row_idx);
        let invalid = results.values().filter(|r| !r.is_valid).count();
        info!(
            "Reference row {} set for table {}: {} of {} row(s) need attention",
            row_idx,
            table_idx,
            invalid,
            results.len()
        );
        *self = FormatSession::ReferenceSet(ReferenceRow {
            table_idx,
            row_id: row.id(),
            row_idx,
            cells: row.cells.clone(),
            results,
        });
        Ok(())
    }

    pub fn clear_reference(&mut self) {
        *self = FormatSession::NoReference;
    }

    /// Re-reads the reference row (it may have moved or changed) and validates again.
    ///
    /// Drops back to `NoReference` if the reference row no longer exists.
    pub fn revalidate(&mut self, editor: &Editor) -> EditResult<()> {
        let (table_idx, row_id) = {
            let reference = self.reference_or_err()?;
            (reference.table_idx, reference.row_id)
        };
        let table = editor.table(table_idx)?;
        match table.position_of(row_id) {
            Some(row_idx) => self.set_reference(table, table_idx, row_idx),
            None => {
                warn!("Reference row was removed from table {table_idx}; clearing it");
                self.clear_reference();
                Err(EditError::NoReferenceRow)
            }
        }
    }

    /// Locally corrects every invalid row in one undoable step, then revalidates.
    pub fn auto_correct_all(&mut self, editor: &mut Editor) -> EditResult<CorrectionReport> {
        let reference = self.reference_or_err()?.clone();
        let table = editor.table(reference.table_idx)?;
        let mut updates = Vec::new();
        let mut placeholders = Vec::new();
        for row_idx in self.invalid_rows() {
            let Some(target) = table.row(row_idx) else {
                continue;
            };
            let corrections = correct_row_format_detailed(&reference.cells, target);
            if corrections.is_empty() {
                continue;
            }
            let mut corrected = target.to_vec();
            for cell in corrections {
                if cell.correction.is_placeholder() {
                    placeholders.push((row_idx, cell.col_idx));
                }
                corrected[cell.col_idx] = cell.correction.into_value(&cell.original);
            }
            updates.push((row_idx, corrected));
        }

        let corrected_rows = updates.iter().map(|(idx, _)| *idx).collect::<Vec<_>>();
        if !updates.is_empty() {
            editor.apply_row_updates(reference.table_idx, "auto-correct rows", updates)?;
        }
        if !placeholders.is_empty() {
            warn!(
                "{} cell(s) received placeholder values during auto-correct",
                placeholders.len()
            );
        }
        self.revalidate(editor)?;
        Ok(CorrectionReport {
            corrected_rows,
            placeholders,
            source: CorrectionSource::Local,
        })
    }

    /// Corrects one row. `Ok(None)` means the row needed no change.
    pub fn correct_single_row(&mut self, editor: &mut Editor, row_idx: usize) -> EditResult<Option<Vec<String>>> {
        let reference = self.reference_or_err()?.clone();
        let table = editor.table(reference.table_idx)?;
        table.ensure_row(row_idx)?;
        let Some(corrected) = table
            .row(row_idx)
            .and_then(|target| correct_row_format(&reference.cells, target))
        else {
            debug!("Row {row_idx} already matches the reference format");
            return Ok(None);
        };
        editor.apply_row_updates(
            reference.table_idx,
            "correct row",
            vec![(row_idx, corrected.clone())],
        )?;
        self.revalidate(editor)?;
        Ok(Some(corrected))
    }

    /// Collects the invalid rows for the remote corrector. `Ok(None)` when
    /// every row already matches the reference.
    ///
    /// Starting a new request makes any earlier pending correction stale.
    pub fn begin_remote_corrections(&self, editor: &mut Editor) -> EditResult<Option<PendingCorrection>> {
        let reference = self.reference_or_err()?;
        let table = editor.table(reference.table_idx)?;
        let requests = reference
            .results
            .iter()
            .filter(|(_, result)| !result.is_valid)
            .filter_map(|(idx, result)| {
                table.row(*idx).map(|row| RowCorrectionRequest {
                    row_idx: *idx,
                    row: row.to_vec(),
                    issues: result.issues.clone(),
                })
            })
            .collect::<Vec<_>>();
        if requests.is_empty() {
            return Ok(None);
        }
        let header = table.header.clone();
        Ok(Some(PendingCorrection {
            ticket: editor.begin_request(RequestKind::RowCorrection),
            table_idx: reference.table_idx,
            reference_idx: reference.row_idx,
            reference: reference.cells.clone(),
            header,
            requests,
        }))
    }

    /// Applies the corrector's answer to `pending`, falling back to
    /// [`auto_correct_all`](Self::auto_correct_all) on failure or an empty answer.
    ///
    /// `Ok(None)` means the answer arrived after a newer request, a table edit
    /// or a reference change, and nothing was applied.
    pub fn finish_remote_corrections(
        &mut self,
        editor: &mut Editor,
        pending: PendingCorrection,
        response: anyhow::Result<Vec<CorrectedRow>>,
    ) -> EditResult<Option<CorrectionReport>> {
        if !editor.accepts(&pending.ticket) {
            return Ok(None);
        }
        let reference = self.reference_or_err()?;
        if reference.table_idx != pending.table_idx
            || reference.row_idx != pending.reference_idx
            || reference.cells != pending.reference
        {
            debug!("Reference row changed since the correction request; discarding response");
            return Ok(None);
        }

        let corrected = match response {
            Ok(rows) => rows,
            Err(err) => {
                warn!("Remote row correction failed: {err:#}; correcting locally");
                return self.auto_correct_all(editor).map(Some);
            }
        };
        let row_count = editor.table(pending.table_idx)?.row_count();
        let updates = corrected
            .into_iter()
            .filter(|row| {
                let in_range = row.row_idx < row_count;
                if !in_range {
                    warn!("Remote corrector returned out-of-range row {}", row.row_idx);
                }
                in_range
            })
            .map(|row| (row.row_idx, row.corrected_row))
            .collect::<Vec<_>>();
        if updates.is_empty() {
            info!("Remote corrector returned no usable rows; correcting locally");
            return self.auto_correct_all(editor).map(Some);
        }

        let corrected_rows = updates.iter().map(|(idx, _)| *idx).collect();
        editor.apply_row_updates(pending.table_idx, "remote row correction", updates)?;
        self.revalidate(editor)?;
        Ok(Some(CorrectionReport {
            corrected_rows,
            placeholders: Vec::new(),
            source: CorrectionSource::Remote,
        }))
    }

    /// Asks the remote corrector to fix every invalid row and applies the answer.
    pub fn apply_remote_corrections(
        &mut self,
        editor: &mut Editor,
        service: &dyn RowCorrectionService,
    ) -> EditResult<CorrectionReport> {
        let Some(pending) = self.begin_remote_corrections(editor)? else {
            return Ok(CorrectionReport::nothing(CorrectionSource::Remote));
        };
        let response = service.correct(&pending.reference, &pending.requests, &pending.header);
        Ok(self
            .finish_remote_corrections(editor, pending, response)?
            .unwrap_or_else(|| CorrectionReport::nothing(CorrectionSource::Remote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn currency_correction_keeps_reference_symbol_and_sign() {
        assert_eq!(
            correct_cell_value("approx 1,200.50 EUR", DataType::Currency, "€10"),
            Correction::Corrected("€1,200.50".to_string())
        );
        assert_eq!(
            correct_cell_value("-45", DataType::Currency, "$1"),
            Correction::Corrected("($45)".to_string())
        );
        assert_eq!(
            correct_cell_value("n/a", DataType::Currency, "$1"),
            Correction::Placeholder(DEFAULT_CURRENCY.to_string())
        );
    }

    #[test]
    fn leading_dot_decimals_keep_their_value() {
        assert_eq!(
            correct_cell_value(".75", DataType::Currency, "$1.00"),
            Correction::Corrected("$0.75".to_string())
        );
        assert_eq!(
            correct_cell_value("$.75", DataType::Number, "1"),
            Correction::Corrected("0.75".to_string())
        );
        assert_eq!(
            correct_cell_value("(.5)", DataType::Number, "1"),
            Correction::Corrected("-0.5".to_string())
        );
        assert_eq!(
            correct_row_format(&row(&["$1.00"]), &row(&[".75"])),
            Some(row(&["$0.75"]))
        );
    }

    #[test]
    fn negative_percentage_is_not_flipped() {
        assert_eq!(
            correct_cell_value("-5", DataType::Percentage, "5%"),
            Correction::Unresolvable
        );
        assert_eq!(
            correct_cell_value("(2.5)", DataType::Percentage, "5%"),
            Correction::Unresolvable
        );
        assert_eq!(
            correct_cell_value("5.25", DataType::Percentage, "5%"),
            Correction::Corrected("5.25%".to_string())
        );
        assert_eq!(correct_row_format(&row(&["5%"]), &row(&["-5"])), None);
    }

    #[test]
    fn date_correction_normalizes_iso_dates() {
        assert_eq!(
            correct_cell_value("paid 2024-03-07", DataType::Date, "01/01/2024"),
            Correction::Corrected("03/07/2024".to_string())
        );
        assert_eq!(
            correct_cell_value("3-7-2024", DataType::Date, "01/01/2024"),
            Correction::Corrected("3/7/2024".to_string())
        );
        assert!(correct_cell_value("soon", DataType::Date, "01/01/2024").is_placeholder());
    }

    #[test]
    fn number_without_digits_is_unresolvable() {
        assert_eq!(
            correct_cell_value("fifty", DataType::Number, "50"),
            Correction::Unresolvable
        );
        assert_eq!(correct_row_format(&row(&["50"]), &row(&["fifty"])), None);
    }

    #[test]
    fn validation_skips_blank_reference_and_target_cells() {
        let result = validate_row_format(&row(&["", "$5", "x"]), &row(&["12", "", "4"]));
        assert_eq!(
            result.issues,
            vec!["Column 3: Expected text, got number (4)".to_string()]
        );
    }
}
