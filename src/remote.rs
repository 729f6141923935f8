//! Contracts for the services the editor talks to but does not own.
//!
//! Remote calls are trait methods returning [`anyhow::Result`]; a failure or
//! an empty answer sends the caller down its local fallback. Callers that
//! wait on a service elsewhere use the editor's `begin_*`/`finish_*` pairs:
//! [`RequestTracker`] tags each request with a ticket, and an answer whose
//! ticket went stale in the meantime is discarded.

use std::collections::HashMap;

use anyhow::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{mapping::FieldMapping, table::Table, table::TableCollection};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    #[serde(default)]
    pub tables: TableCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCorrectionRequest {
    pub row_idx: usize,
    pub row: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectedRow {
    pub row_idx: usize,
    pub corrected_row: Vec<String>,
}

pub trait ExtractionService {
    fn extract(&self, upload_id: &str) -> Result<ExtractionResponse>;
}

pub trait SummaryRowService {
    fn detect(&self, header: &[String], rows: &[Vec<String>]) -> Result<Vec<usize>>;
}

pub trait RowCorrectionService {
    fn correct(
        &self,
        reference: &[String],
        requests: &[RowCorrectionRequest],
        header: &[String],
    ) -> Result<Vec<CorrectedRow>>;
}

pub trait PatternLearningService {
    fn learn(&self, table: &Table, summary_rows: &[usize]) -> Result<()>;
}

/// Offline stand-in: every call fails, so local heuristics always run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl ExtractionService for NoRemote {
    fn extract(&self, upload_id: &str) -> Result<ExtractionResponse> {
        bail!("No extraction service configured (upload '{upload_id}')")
    }
}

impl SummaryRowService for NoRemote {
    fn detect(&self, _header: &[String], _rows: &[Vec<String>]) -> Result<Vec<usize>> {
        bail!("No remote summary-row detector configured")
    }
}

impl RowCorrectionService for NoRemote {
    fn correct(
        &self,
        _reference: &[String],
        _requests: &[RowCorrectionRequest],
        _header: &[String],
    ) -> Result<Vec<CorrectedRow>> {
        bail!("No remote row corrector configured")
    }
}

impl PatternLearningService for NoRemote {
    fn learn(&self, _table: &Table, _summary_rows: &[usize]) -> Result<()> {
        bail!("No pattern-learning service configured")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    SummaryDetection,
    RowCorrection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    kind: RequestKind,
    generation: u64,
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    generations: HashMap<RequestKind, u64>,
    // Bumped whenever the tables change; tickets from an older epoch are stale.
    epoch: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request, making every earlier ticket of the same kind stale.
    pub fn begin(&mut self, kind: RequestKind) -> RequestTicket {
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        RequestTicket {
            kind,
            generation: *generation,
            epoch: self.epoch,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.epoch == self.epoch
            && self.generations.get(&ticket.kind).copied() == Some(ticket.generation)
    }

    /// True if the response for `ticket` should be applied.
    pub fn accept(&self, ticket: &RequestTicket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(
                "Discarding stale {:?} response (generation {})",
                ticket.kind, ticket.generation
            );
        }
        current
    }

    pub fn cancel(&mut self, kind: RequestKind) {
        *self.generations.entry(kind).or_insert(0) += 1;
    }

    /// Makes every outstanding ticket stale, whatever its kind.
    pub fn invalidate_all(&mut self) {
        self.epoch += 1;
    }
}

/// What the save/approve flow receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    pub tables: TableCollection,
    pub field_mappings: Vec<ResolvedMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMapping {
    pub mapping: FieldMapping,
    pub selected_field: String,
}
