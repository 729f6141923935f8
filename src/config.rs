//! Editor configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock heuristics: a 0.7 similarity threshold, 100 history entries, and
//! columns 3 through 6 scanned for totals.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    pub fn contains(&self, col_idx: usize) -> bool {
        (self.start..=self.end).contains(&col_idx)
    }
}

impl Default for ColumnSpan {
    fn default() -> Self {
        Self { start: 2, end: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub similarity_threshold: f64,
    /// Maximum undo entries kept; 0 keeps everything.
    pub history_limit: usize,
    /// Columns (0-based, inclusive) where a summary row is expected to carry its totals.
    pub summary_numeric_columns: ColumnSpan,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            history_limit: DEFAULT_HISTORY_LIMIT,
            summary_numeric_columns: ColumnSpan::default(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading editor config {path:?}"))?;
        let config = Self::from_yaml(&raw).with_context(|| format!("Parsing {path:?}"))?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: EditorConfig = if raw.trim().is_empty() {
            EditorConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.similarity_threshold),
            "similarity_threshold must be between 0 and 1 (got {})",
            self.similarity_threshold
        );
        ensure!(
            self.summary_numeric_columns.start <= self.summary_numeric_columns.end,
            "summary_numeric_columns.start ({}) cannot exceed end ({})",
            self.summary_numeric_columns.start,
            self.summary_numeric_columns.end
        );
        Ok(())
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
