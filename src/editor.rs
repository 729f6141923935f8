//! Editing session over a table collection.
//!
//! [`Editor`] is the single entry point for mutation intents coming from the
//! UI. It snapshots the collection into [`History`] before every mutation,
//! delegates to [`mutation`], and keeps the merge log in step with
//! undo/redo. A rejected operation returns an [`EditError`] and leaves both
//! the tables and the history untouched. Every change to the tables makes
//! outstanding remote requests stale.

use std::collections::HashMap;

use log::{info, warn};

use crate::{
    config::EditorConfig,
    error::{EditError, EditResult},
    history::{EntryKind, History},
    mapping::{DatabaseField, FieldMapping, resolve_all},
    mutation::{self, MergeRecord},
    remote::{
        ApprovalPayload, PatternLearningService, RequestKind, RequestTicket, RequestTracker,
        SummaryRowService,
    },
    summary::{self, DetectionOutcome},
    table::{RowId, Table, TableCollection},
};

/// A cell being edited. Holds the row's id so the edit survives row inserts above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub table_idx: usize,
    pub row_idx: usize,
    pub col_idx: usize,
    pub pending_value: String,
    row_id: RowId,
}

/// A detection request sent to the remote detector and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDetection {
    ticket: RequestTicket,
    pub table_idx: usize,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct Editor {
    tables: TableCollection,
    history: History,
    merges: Vec<MergeRecord>,
    config: EditorConfig,
    active_edit: Option<CellEdit>,
    requests: RequestTracker,
}

impl Editor {
    pub fn new(tables: TableCollection, config: EditorConfig) -> Self {
        let history = History::new(config.history_limit);
        Self {
            tables,
            history,
            merges: Vec::new(),
            config,
            active_edit: None,
            requests: RequestTracker::new(),
        }
    }

    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    pub fn table(&self, table_idx: usize) -> EditResult<&Table> {
        self.tables.get(table_idx)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn merge_count(&self) -> usize {
        self.merges.len()
    }

    pub fn into_tables(self) -> TableCollection {
        self.tables
    }

    /// Runs `op` against the tables, recording a snapshot only when it succeeds.
    fn apply<T>(
        &mut self,
        label: &'static str,
        op: impl FnOnce(&mut TableCollection) -> EditResult<T>,
    ) -> EditResult<T> {
        let snapshot = self.tables.clone();
        let value = op(&mut self.tables)?;
        self.history.save_snapshot(snapshot, EntryKind::Edit(label));
        self.requests.invalidate_all();
        Ok(value)
    }

    pub(crate) fn begin_request(&mut self, kind: RequestKind) -> RequestTicket {
        self.requests.begin(kind)
    }

    pub(crate) fn accepts(&self, ticket: &RequestTicket) -> bool {
        self.requests.accept(ticket)
    }

    /// Drops any outstanding request of `kind`; its answer will be ignored.
    pub fn cancel_requests(&mut self, kind: RequestKind) {
        self.requests.cancel(kind);
    }

    pub fn undo(&mut self) -> bool {
        let Some(kind) = self.history.undo(&mut self.tables) else {
            return false;
        };
        self.requests.invalidate_all();
        info!("Undid '{}'", kind.label());
        match kind {
            EntryKind::Merge(_) => {
                self.merges.pop();
            }
            EntryKind::RevertMerge(record) => self.merges.push(record),
            EntryKind::Edit(_) => {}
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(kind) = self.history.redo(&mut self.tables) else {
            return false;
        };
        self.requests.invalidate_all();
        info!("Redid '{}'", kind.label());
        match kind {
            EntryKind::Merge(record) => self.merges.push(record),
            EntryKind::RevertMerge(_) => {
                self.merges.pop();
            }
            EntryKind::Edit(_) => {}
        }
        true
    }

    /// Forgets all undo, redo and merge history (after a successful save).
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.merges.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn add_row_above(&mut self, table_idx: usize, row_idx: usize) -> EditResult<usize> {
        self.apply("add row above", |t| mutation::add_row_above(t, table_idx, row_idx))
    }

    pub fn add_row_below(&mut self, table_idx: usize, row_idx: usize) -> EditResult<usize> {
        self.apply("add row below", |t| mutation::add_row_below(t, table_idx, row_idx))
    }

    pub fn delete_row(&mut self, table_idx: usize, row_idx: usize) -> EditResult<Vec<String>> {
        self.apply("delete row", |t| mutation::delete_row(t, table_idx, row_idx))
    }

    pub fn duplicate_row(&mut self, table_idx: usize, row_idx: usize) -> EditResult<usize> {
        self.apply("duplicate row", |t| mutation::duplicate_row(t, table_idx, row_idx))
    }

    pub fn add_column(&mut self, table_idx: usize, col_idx: usize, name: &str) -> EditResult<()> {
        self.apply("add column", |t| mutation::add_column(t, table_idx, col_idx, name))
    }

    pub fn delete_column(&mut self, table_idx: usize, col_idx: usize) -> EditResult<String> {
        self.apply("delete column", |t| mutation::delete_column(t, table_idx, col_idx))
    }

    pub fn rename_column(&mut self, table_idx: usize, col_idx: usize, name: &str) -> EditResult<String> {
        self.apply("rename column", |t| mutation::rename_column(t, table_idx, col_idx, name))
    }

    pub fn update_cell(
        &mut self,
        table_idx: usize,
        row_idx: usize,
        col_idx: usize,
        value: &str,
    ) -> EditResult<String> {
        self.apply("edit cell", |t| {
            mutation::update_cell(t, table_idx, row_idx, col_idx, value.to_string())
        })
    }

    pub fn merge_columns(&mut self, table_idx: usize, col1_idx: usize, col2_idx: usize) -> EditResult<()> {
        let snapshot = self.tables.clone();
        let record = mutation::merge_columns(&mut self.tables, table_idx, col1_idx, col2_idx)?;
        self.history
            .save_snapshot(snapshot, EntryKind::Merge(record.clone()));
        self.merges.push(record);
        self.requests.invalidate_all();
        info!("Merged columns {col1_idx} and {col2_idx} in table {table_idx}");
        Ok(())
    }

    /// Restores the table touched by the newest merge to its pre-merge header and rows.
    ///
    /// Edits made to that table after the merge are discarded. The revert is
    /// itself undoable.
    pub fn revert_last_merge(&mut self) -> EditResult<usize> {
        let record = self.merges.last().cloned().ok_or(EditError::NoMergeToRevert)?;
        let snapshot = self.tables.clone();
        mutation::restore_merge(&mut self.tables, &record)?;
        self.merges.pop();
        let table_idx = record.table_idx;
        self.history
            .save_snapshot(snapshot, EntryKind::RevertMerge(record));
        self.requests.invalidate_all();
        info!("Reverted merge on table {table_idx}");
        Ok(table_idx)
    }

    pub fn begin_cell_edit(&mut self, table_idx: usize, row_idx: usize, col_idx: usize) -> EditResult<&CellEdit> {
        let table = self.tables.get(table_idx)?;
        table.ensure_row(row_idx)?;
        table.ensure_column(col_idx)?;
        let edit = CellEdit {
            table_idx,
            row_idx,
            col_idx,
            pending_value: table.rows()[row_idx].cells[col_idx].clone(),
            row_id: table.rows()[row_idx].id(),
        };
        let edit = self.active_edit.insert(edit);
        Ok(&*edit)
    }

    pub fn active_edit(&self) -> Option<&CellEdit> {
        self.active_edit.as_ref()
    }

    pub fn update_pending(&mut self, value: &str) -> EditResult<()> {
        let edit = self.active_edit.as_mut().ok_or(EditError::NoActiveEdit)?;
        edit.pending_value = value.to_string();
        Ok(())
    }

    /// Writes the pending value into the cell, wherever its row has moved to.
    pub fn commit_cell_edit(&mut self) -> EditResult<String> {
        let edit = self.active_edit.take().ok_or(EditError::NoActiveEdit)?;
        let table = self.tables.get(edit.table_idx)?;
        let row_idx = table.position_of(edit.row_id).ok_or(EditError::RowOutOfRange {
            row_idx: edit.row_idx,
            row_count: table.row_count(),
        })?;
        self.update_cell(edit.table_idx, row_idx, edit.col_idx, &edit.pending_value)
    }

    pub fn cancel_cell_edit(&mut self) -> Option<CellEdit> {
        self.active_edit.take()
    }

    /// Flags a row plus every row similar to it. Returns the rows newly flagged.
    pub fn mark_as_summary_row(&mut self, table_idx: usize, row_idx: usize) -> EditResult<Vec<usize>> {
        let threshold = self.config.similarity_threshold;
        let added = self.apply("mark summary row", |t| {
            summary::mark_summary_row(t.get_mut(table_idx)?, row_idx, threshold)
        })?;
        info!(
            "Marked {} summary row(s) in table {} starting from row {}",
            added.len(),
            table_idx,
            row_idx
        );
        Ok(added)
    }

    pub fn unmark_as_summary_row(&mut self, table_idx: usize, row_idx: usize) -> EditResult<bool> {
        self.apply("unmark summary row", |t| {
            summary::unmark_summary_row(t.get_mut(table_idx)?, row_idx)
        })
    }

    pub fn delete_summary_rows(&mut self, table_idx: usize) -> EditResult<usize> {
        let removed = self.apply("delete summary rows", |t| {
            Ok(summary::delete_summary_rows(t.get_mut(table_idx)?))
        })?;
        info!("Deleted {removed} summary row(s) from table {table_idx}");
        Ok(removed)
    }

    /// Replaces a table's summary flags with `rows`.
    pub fn apply_detected_summary_rows(&mut self, table_idx: usize, rows: &[usize]) -> EditResult<usize> {
        self.apply("detect summary rows", |t| {
            Ok(t.get_mut(table_idx)?.set_summary_rows(rows))
        })
    }

    /// Captures what the remote detector needs for `table_idx`. Any earlier
    /// pending detection becomes stale.
    pub fn begin_summary_detection(&mut self, table_idx: usize) -> EditResult<PendingDetection> {
        let table = self.tables.get(table_idx)?;
        let header = table.header.clone();
        let rows = table.row_values();
        Ok(PendingDetection {
            ticket: self.requests.begin(RequestKind::SummaryDetection),
            table_idx,
            header,
            rows,
        })
    }

    /// Flags the rows named by the detector's answer, or by the local rules
    /// when it failed or found nothing.
    ///
    /// `Ok(None)` means the answer arrived after a newer detection or a table
    /// edit, and nothing was applied.
    pub fn finish_summary_detection(
        &mut self,
        pending: PendingDetection,
        response: anyhow::Result<Vec<usize>>,
    ) -> EditResult<Option<DetectionOutcome>> {
        if !self.requests.accept(&pending.ticket) {
            return Ok(None);
        }
        let outcome = summary::resolve_detection(
            response,
            self.tables.get(pending.table_idx)?,
            &self.config,
        );
        self.apply_detected_summary_rows(pending.table_idx, &outcome.rows)?;
        Ok(Some(outcome))
    }

    /// Detects summary rows (remote first, local fallback) and flags them.
    pub fn detect_summary_rows(
        &mut self,
        table_idx: usize,
        service: &dyn SummaryRowService,
    ) -> EditResult<Option<DetectionOutcome>> {
        let pending = self.begin_summary_detection(table_idx)?;
        let response = service.detect(&pending.header, &pending.rows);
        self.finish_summary_detection(pending, response)
    }

    /// Sends the flagged rows to the pattern-learning service. Failures are logged, not raised.
    pub fn learn_summary_pattern(
        &self,
        table_idx: usize,
        service: &dyn PatternLearningService,
    ) -> EditResult<bool> {
        let table = self.tables.get(table_idx)?;
        let rows = table.summary_row_indices();
        match service.learn(table, &rows) {
            Ok(()) => {
                info!("Learned summary pattern from {} row(s)", rows.len());
                Ok(true)
            }
            Err(err) => {
                warn!("Pattern learning failed: {err:#}");
                Ok(false)
            }
        }
    }

    /// Overwrites whole rows in one undoable step. Indices are checked up front.
    pub fn apply_row_updates(
        &mut self,
        table_idx: usize,
        label: &'static str,
        updates: Vec<(usize, Vec<String>)>,
    ) -> EditResult<usize> {
        self.apply(label, |t| {
            let table = t.get_mut(table_idx)?;
            for (row_idx, _) in &updates {
                table.ensure_row(*row_idx)?;
            }
            let count = updates.len();
            for (row_idx, cells) in updates {
                if let Some(row) = table.row_mut(row_idx) {
                    *row = cells;
                }
            }
            table.repair_shape();
            Ok(count)
        })
    }

    pub fn approval_payload(
        &self,
        mappings: &[FieldMapping],
        user_selections: &HashMap<String, String>,
        database_fields: &[DatabaseField],
    ) -> ApprovalPayload {
        ApprovalPayload {
            tables: self.tables.clone(),
            field_mappings: resolve_all(mappings, user_selections, database_fields),
        }
    }

    /// Call once the approval flow has persisted the tables.
    pub fn mark_saved(&mut self) {
        self.clear_history();
        self.active_edit = None;
        info!("Editing history cleared after save");
    }
}
