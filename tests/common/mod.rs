#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use table_review::table::{Table, TableCollection};
use tempfile::{TempDir, tempdir};

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Builds a table from string literals; the first slice is the header.
pub fn table(header: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(strings(header), rows.iter().map(|row| strings(row)).collect())
}

/// A commission statement with two agents, a subtotal per agent and a grand total.
pub fn statement() -> TableCollection {
    TableCollection::new(vec![
        table(
            &["Agent", "Policy", "Premium", "Rate", "Paid"],
            &[
                &["Alice", "P-100", "$1,200.00", "5%", "01/15/2024"],
                &["Alice", "P-101", "$800.00", "5%", "01/16/2024"],
                &["Subtotal: Alice", "", "$2,000.00", "", ""],
                &["Bob", "P-200", "$500.00", "4%", "01/20/2024"],
                &["Subtotal: Bob", "", "$500.00", "", ""],
                &["Grand Total", "", "$2,500.00", "", ""],
            ],
        )
        .with_name("Commissions"),
    ])
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
