use std::collections::VecDeque;

use log::debug;

use crate::{mutation::MergeRecord, table::TableCollection};

/// What the snapshot was taken before. Merge tags let undo and redo keep the
/// merge log in step.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Edit(&'static str),
    Merge(MergeRecord),
    RevertMerge(MergeRecord),
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Edit(label) => *label,
            EntryKind::Merge(_) => "merge columns",
            EntryKind::RevertMerge(_) => "revert merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub snapshot: TableCollection,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    /// `limit` of 0 keeps every entry.
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Pushes the pre-mutation state and starts a new branch of history.
    pub fn save_snapshot(&mut self, snapshot: TableCollection, kind: EntryKind) {
        debug!("Saving snapshot before '{}'", kind.label());
        self.undo_stack.push_back(HistoryEntry { kind, snapshot });
        self.redo_stack.clear();
        if self.limit > 0 {
            while self.undo_stack.len() > self.limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Restores the most recent snapshot into `current`. Returns the undone operation.
    pub fn undo(&mut self, current: &mut TableCollection) -> Option<EntryKind> {
        let entry = self.undo_stack.pop_back()?;
        let previous = std::mem::replace(current, entry.snapshot);
        self.redo_stack.push(HistoryEntry {
            kind: entry.kind.clone(),
            snapshot: previous,
        });
        Some(entry.kind)
    }

    pub fn redo(&mut self, current: &mut TableCollection) -> Option<EntryKind> {
        let entry = self.redo_stack.pop()?;
        let previous = std::mem::replace(current, entry.snapshot);
        self.undo_stack.push_back(HistoryEntry {
            kind: entry.kind.clone(),
            snapshot: previous,
        });
        Some(entry.kind)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
