//! JSON reading and writing for table collections.
//!
//! Input accepts either the extraction service envelope
//! (`{"success": true, "tables": [...]}`) or a bare array of tables. The `-`
//! path convention routes through stdin/stdout.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::{remote::ExtractionResponse, table::TableCollection};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Opening {path:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if !is_dash(path) => {
            let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TablesDocument {
    Envelope(ExtractionResponse),
    Bare(TableCollection),
}

pub fn parse_tables(raw: &str) -> Result<TableCollection> {
    let document: TablesDocument =
        serde_json::from_str(raw).context("Parsing table collection JSON")?;
    match document {
        TablesDocument::Envelope(response) if !response.success => {
            bail!("Extraction response reports failure")
        }
        TablesDocument::Envelope(response) => Ok(response.tables),
        TablesDocument::Bare(tables) => Ok(tables),
    }
}

pub fn read_tables(path: &Path) -> Result<TableCollection> {
    let mut raw = String::new();
    open_reader(path)?
        .read_to_string(&mut raw)
        .with_context(|| format!("Reading {path:?}"))?;
    parse_tables(&raw).with_context(|| format!("Loading tables from {path:?}"))
}

pub fn write_tables(path: Option<&Path>, tables: &TableCollection) -> Result<()> {
    let envelope = ExtractionResponse {
        success: true,
        tables: tables.clone(),
    };
    let mut writer = open_writer(path)?;
    serde_json::to_writer_pretty(&mut writer, &envelope).context("Serializing tables")?;
    writeln!(writer)?;
    writer.flush().context("Flushing output")?;
    Ok(())
}
