//! Structural edits over a [`TableCollection`].
//!
//! Each function validates every index before touching anything, so an
//! `Err` always means the collection is unchanged. Column inserts and
//! deletes update the header and every row in the same call; no caller can
//! observe a table whose rows disagree with its header.
//!
//! These functions do not record history. The [`Editor`](crate::editor::Editor)
//! snapshots the collection before delegating here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::{
    error::{EditError, EditResult},
    table::{Row, RowId, TableCollection},
};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    pub table_idx: usize,
    pub col1_idx: usize,
    pub col2_idx: usize,
    pub original_header: Vec<String>,
    pub original_rows: Vec<Row>,
    pub original_summary_rows: BTreeSet<RowId>,
    /// Header right after the merge; used to notice edits made before a revert.
    pub merged_header: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

fn blank_row(width: usize) -> Vec<String> {
    vec![String::new(); width]
}

/// Inserts a blank row at `row_idx`; `row_idx` may equal the row count.
pub fn add_row_above(tables: &mut TableCollection, table_idx: usize, row_idx: usize) -> EditResult<usize> {
    let table = tables.get_mut(table_idx)?;
    if row_idx > table.row_count() {
        return Err(EditError::RowOutOfRange {
            row_idx,
            row_count: table.row_count(),
        });
    }
    table.insert_row(row_idx, blank_row(table.column_count()));
    Ok(row_idx)
}

pub fn add_row_below(tables: &mut TableCollection, table_idx: usize, row_idx: usize) -> EditResult<usize> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_row(row_idx)?;
    table.insert_row(row_idx + 1, blank_row(table.column_count()));
    Ok(row_idx + 1)
}

pub fn delete_row(tables: &mut TableCollection, table_idx: usize, row_idx: usize) -> EditResult<Vec<String>> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_row(row_idx)?;
    let removed = table.remove_row(row_idx).unwrap_or_default();
    Ok(removed)
}

/// Copies a row and inserts the copy right after it. Summary flags are not copied.
pub fn duplicate_row(tables: &mut TableCollection, table_idx: usize, row_idx: usize) -> EditResult<usize> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_row(row_idx)?;
    let copy = table.rows()[row_idx].cells.clone();
    table.insert_row(row_idx + 1, copy);
    Ok(row_idx + 1)
}

pub fn update_cell(
    tables: &mut TableCollection,
    table_idx: usize,
    row_idx: usize,
    col_idx: usize,
    value: String,
) -> EditResult<String> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_column(col_idx)?;
    let row_count = table.row_count();
    let cells = table
        .row_mut(row_idx)
        .ok_or(EditError::RowOutOfRange { row_idx, row_count })?;
    Ok(std::mem::replace(&mut cells[col_idx], value))
}

/// Inserts a column at `col_idx` (which may equal the column count).
pub fn add_column(
    tables: &mut TableCollection,
    table_idx: usize,
    col_idx: usize,
    name: impl Into<String>,
) -> EditResult<()> {
    let table = tables.get_mut(table_idx)?;
    if col_idx > table.column_count() {
        return Err(EditError::ColumnOutOfRange {
            col_idx,
            col_count: table.column_count(),
        });
    }
    table.header.insert(col_idx, name.into());
    for cells in table.rows_mut() {
        let at = col_idx.min(cells.len());
        cells.insert(at, String::new());
    }
    table.repair_shape();
    Ok(())
}

pub fn delete_column(tables: &mut TableCollection, table_idx: usize, col_idx: usize) -> EditResult<String> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_column(col_idx)?;
    let removed = table.header.remove(col_idx);
    for cells in table.rows_mut() {
        if col_idx < cells.len() {
            cells.remove(col_idx);
        }
    }
    table.repair_shape();
    Ok(removed)
}

pub fn rename_column(
    tables: &mut TableCollection,
    table_idx: usize,
    col_idx: usize,
    name: impl Into<String>,
) -> EditResult<String> {
    let table = tables.get_mut(table_idx)?;
    table.ensure_column(col_idx)?;
    Ok(std::mem::replace(&mut table.header[col_idx], name.into()))
}

fn merge_values(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (false, false) => format!("{left} {right}"),
        (false, true) => left.to_string(),
        (true, false) => right.to_string(),
        (true, true) => String::new(),
    }
}

/// Folds `col2` into `col1` and removes `col2`.
///
/// The header becomes `"{h1} - {h2}"` and each cell `"{v1} {v2}"`, or just
/// the non-blank side when one is blank.
pub fn merge_columns(
    tables: &mut TableCollection,
    table_idx: usize,
    col1_idx: usize,
    col2_idx: usize,
) -> EditResult<MergeRecord> {
    if col1_idx == col2_idx {
        return Err(EditError::MergeSameColumn(col1_idx));
    }
    let table = tables.get_mut(table_idx)?;
    table.ensure_column(col1_idx)?;
    table.ensure_column(col2_idx)?;

    let original_header = table.header.clone();
    let original_rows = table.rows().to_vec();
    let original_summary_rows = table.summary_row_ids().clone();

    table.header[col1_idx] = format!("{} - {}", table.header[col1_idx], table.header[col2_idx]);
    table.header.remove(col2_idx);
    for cells in table.rows_mut() {
        let merged = merge_values(&cells[col1_idx], &cells[col2_idx]);
        cells[col1_idx] = merged;
        cells.remove(col2_idx);
    }
    table.repair_shape();
    debug!(
        "Merged column {} into {} for table {} ({} row(s))",
        col2_idx,
        col1_idx,
        table_idx,
        table.row_count()
    );

    Ok(MergeRecord {
        table_idx,
        col1_idx,
        col2_idx,
        original_header,
        original_rows,
        original_summary_rows,
        merged_header: table.header.clone(),
        timestamp: Utc::now(),
    })
}

/// Puts a table's header and rows back to how they were before `record`'s merge.
pub fn restore_merge(tables: &mut TableCollection, record: &MergeRecord) -> EditResult<()> {
    let table = tables.get_mut(record.table_idx)?;
    if table.header != record.merged_header {
        warn!(
            "Table {} changed since the merge at {}; restoring the pre-merge state anyway",
            record.table_idx, record.timestamp
        );
    }
    table.header = record.original_header.clone();
    table.restore_rows(
        record.original_rows.clone(),
        record.original_summary_rows.clone(),
    );
    Ok(())
}
