//! In-memory table model shared by every editing component.
//!
//! A [`Table`] owns its header and an ordered list of [`Row`]s. Each row
//! carries a [`RowId`] handed out by the table when the row is created, so
//! flags such as summary rows follow the logical row through inserts and
//! deletes instead of pointing at a position. Positional indices are derived
//! on demand.
//!
//! The JSON wire form (see [`TableWire`]) is the shape exchanged with the
//! extraction service and the approval flow: rows are plain string arrays and
//! `summaryRows` is an explicit ascending index array.

use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EditError, EditResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    pub cells: Vec<String>,
}

impl Row {
    pub fn id(&self) -> RowId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub header: Vec<String>,
    rows: Vec<Row>,
    pub name: Option<String>,
    summary_rows: BTreeSet<RowId>,
    next_row_id: u64,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Table {
            header,
            ..Table::default()
        };
        table.replace_rows(rows);
        table
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row_idx: usize) -> Option<&[String]> {
        self.rows.get(row_idx).map(|row| row.cells.as_slice())
    }

    pub fn row_mut(&mut self, row_idx: usize) -> Option<&mut Vec<String>> {
        self.rows.get_mut(row_idx).map(|row| &mut row.cells)
    }

    pub fn row_values(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|row| row.cells.clone()).collect()
    }

    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&str> {
        self.rows
            .get(row_idx)
            .and_then(|row| row.cells.get(col_idx))
            .map(String::as_str)
    }

    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn ensure_row(&self, row_idx: usize) -> EditResult<()> {
        if row_idx < self.rows.len() {
            Ok(())
        } else {
            Err(EditError::RowOutOfRange {
                row_idx,
                row_count: self.rows.len(),
            })
        }
    }

    pub fn ensure_column(&self, col_idx: usize) -> EditResult<()> {
        if col_idx < self.header.len() {
            Ok(())
        } else {
            Err(EditError::ColumnOutOfRange {
                col_idx,
                col_count: self.header.len(),
            })
        }
    }

    fn allocate_id(&mut self) -> RowId {
        let id = RowId(self.next_row_id);
        self.next_row_id += 1;
        id
    }

    /// Inserts `cells` at `row_idx` (which may equal the row count) under a fresh id.
    pub fn insert_row(&mut self, row_idx: usize, cells: Vec<String>) -> RowId {
        let id = self.allocate_id();
        let at = row_idx.min(self.rows.len());
        self.rows.insert(at, Row { id, cells });
        id
    }

    pub fn push_row(&mut self, cells: Vec<String>) -> RowId {
        let at = self.rows.len();
        self.insert_row(at, cells)
    }

    /// Removes a row and drops its summary flag.
    pub fn remove_row(&mut self, row_idx: usize) -> Option<Vec<String>> {
        if row_idx >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(row_idx);
        self.summary_rows.remove(&row.id);
        Some(row.cells)
    }

    /// Replaces every row, assigning fresh ids and dropping all summary flags.
    pub fn replace_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows.clear();
        self.summary_rows.clear();
        for cells in rows {
            self.push_row(cells);
        }
        self.repair_shape();
    }

    /// Puts back rows (ids included) and summary flags captured earlier from this table.
    pub(crate) fn restore_rows(&mut self, rows: Vec<Row>, summary_rows: BTreeSet<RowId>) {
        if let Some(max_id) = rows.iter().map(|row| row.id.0).max() {
            self.next_row_id = self.next_row_id.max(max_id + 1);
        }
        self.rows = rows;
        self.summary_rows = summary_rows
            .into_iter()
            .filter(|id| self.rows.iter().any(|row| row.id == *id))
            .collect();
        self.repair_shape();
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Vec<String>> {
        self.rows.iter_mut().map(|row| &mut row.cells)
    }

    /// Pads or truncates rows whose width differs from the header.
    ///
    /// Returns the number of rows touched. A non-zero count after a structural
    /// edit indicates a bug in that edit; it is logged and repaired in place.
    pub fn repair_shape(&mut self) -> usize {
        let width = self.header.len();
        let mut repaired = 0usize;
        for (idx, row) in self.rows.iter_mut().enumerate() {
            if row.cells.len() != width {
                warn!(
                    "Row {} has {} cell(s) but the header has {}; repairing",
                    idx,
                    row.cells.len(),
                    width
                );
                row.cells.resize(width, String::new());
                repaired += 1;
            }
        }
        repaired
    }

    pub fn is_summary_row(&self, row_idx: usize) -> bool {
        self.rows
            .get(row_idx)
            .is_some_and(|row| self.summary_rows.contains(&row.id))
    }

    /// Empty and absent are the same thing here.
    pub fn has_summary_rows(&self) -> bool {
        !self.summary_rows.is_empty()
    }

    pub fn summary_row_ids(&self) -> &BTreeSet<RowId> {
        &self.summary_rows
    }

    /// Positions of flagged rows, ascending.
    pub fn summary_row_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.summary_rows.contains(&row.id))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Flags a row by position. Returns `false` when the row was already flagged.
    pub fn flag_summary_row(&mut self, row_idx: usize) -> EditResult<bool> {
        self.ensure_row(row_idx)?;
        let id = self.rows[row_idx].id;
        Ok(self.summary_rows.insert(id))
    }

    pub fn unflag_summary_row(&mut self, row_idx: usize) -> EditResult<bool> {
        self.ensure_row(row_idx)?;
        let id = self.rows[row_idx].id;
        Ok(self.summary_rows.remove(&id))
    }

    /// Replaces the summary flags with the given positions; out-of-range indices are ignored.
    pub fn set_summary_rows(&mut self, indices: &[usize]) -> usize {
        self.summary_rows.clear();
        for &idx in indices {
            match self.rows.get(idx) {
                Some(row) => {
                    self.summary_rows.insert(row.id);
                }
                None => warn!(
                    "Ignoring summary row index {} (table has {} row(s))",
                    idx,
                    self.rows.len()
                ),
            }
        }
        self.summary_rows.len()
    }

    pub fn clear_summary_rows(&mut self) {
        self.summary_rows.clear();
    }

    pub fn to_wire(&self) -> TableWire {
        let summary_rows = self.summary_row_indices();
        TableWire {
            header: self.header.clone(),
            rows: self.row_values(),
            name: self.name.clone(),
            summary_rows: (!summary_rows.is_empty()).then_some(summary_rows),
        }
    }

    pub fn from_wire(wire: TableWire) -> Self {
        let mut table = Table::new(wire.header, wire.rows);
        table.name = wire.name;
        if let Some(indices) = wire.summary_rows {
            table.set_summary_rows(&indices);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWire {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "summaryRows",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub summary_rows: Option<Vec<usize>>,
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        TableWire::deserialize(deserializer).map(Table::from_wire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableCollection {
    pub tables: Vec<Table>,
}

impl TableCollection {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, table_idx: usize) -> EditResult<&Table> {
        let table_count = self.tables.len();
        self.tables.get(table_idx).ok_or(EditError::TableOutOfRange {
            table_idx,
            table_count,
        })
    }

    pub fn get_mut(&mut self, table_idx: usize) -> EditResult<&mut Table> {
        let table_count = self.tables.len();
        self.tables
            .get_mut(table_idx)
            .ok_or(EditError::TableOutOfRange {
                table_idx,
                table_count,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }
}
