pub mod cli;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod format;
pub mod history;
pub mod io_utils;
pub mod mapping;
pub mod mutation;
pub mod remote;
pub mod render;
pub mod similarity;
pub mod summary;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{Cli, Commands},
    config::EditorConfig,
    editor::Editor,
    format::FormatSession,
    remote::NoRemote,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_review", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = EditorConfig::load_or_default(cli.config.as_deref())
        .context("Loading editor configuration")?;
    match cli.command {
        Commands::Detect(args) => handle_detect(&args, config),
        Commands::Validate(args) => handle_validate(&args, config),
        Commands::Correct(args) => handle_correct(&args, config),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn selected_tables(requested: Option<usize>, count: usize) -> Vec<usize> {
    match requested {
        Some(idx) => vec![idx],
        None => (0..count).collect(),
    }
}

fn handle_detect(args: &cli::DetectArgs, config: EditorConfig) -> Result<()> {
    let tables = io_utils::read_tables(&args.input)?;
    let mut editor = Editor::new(tables, config);
    for table_idx in selected_tables(args.table, editor.tables().len()) {
        let Some(outcome) = editor
            .detect_summary_rows(table_idx, &NoRemote)
            .with_context(|| format!("Detecting summary rows in table {table_idx}"))?
        else {
            warn!("Table {table_idx}: detection answer went stale; flags left unchanged");
            continue;
        };
        info!(
            "Table {}: {} summary row(s) {:?}",
            table_idx,
            outcome.rows.len(),
            outcome.rows
        );
    }
    io_utils::write_tables(args.output.as_deref(), editor.tables())
}

fn handle_validate(args: &cli::ValidateArgs, config: EditorConfig) -> Result<()> {
    let tables = io_utils::read_tables(&args.input)?;
    let editor = Editor::new(tables, config);
    let mut session = FormatSession::new();
    session
        .set_reference(editor.table(args.table)?, args.table, args.reference)
        .with_context(|| format!("Setting reference row {}", args.reference))?;

    let mut rows = Vec::new();
    if let Some(results) = session.results() {
        for (row_idx, result) in results {
            let status = if result.is_valid { "ok" } else { "invalid" };
            rows.push(vec![
                (row_idx + 1).to_string(),
                status.to_string(),
                result.issues.join("; "),
            ]);
        }
    }
    let headers = vec!["row".to_string(), "status".to_string(), "issues".to_string()];
    print!("{}", render::render_grid(&headers, &rows));
    info!(
        "{} of {} row(s) do not match reference row {}",
        session.invalid_rows().len(),
        rows.len(),
        args.reference + 1
    );
    Ok(())
}

fn handle_correct(args: &cli::CorrectArgs, config: EditorConfig) -> Result<()> {
    let tables = io_utils::read_tables(&args.input)?;
    let mut editor = Editor::new(tables, config);
    let mut session = FormatSession::new();
    session
        .set_reference(editor.table(args.table)?, args.table, args.reference)
        .with_context(|| format!("Setting reference row {}", args.reference))?;
    let report = session
        .auto_correct_all(&mut editor)
        .context("Correcting rows")?;
    for (row_idx, col_idx) in &report.placeholders {
        warn!(
            "Row {} column {} received a placeholder value; review it manually",
            row_idx + 1,
            col_idx + 1
        );
    }
    info!(
        "Corrected {} row(s); {} row(s) still invalid",
        report.corrected_rows.len(),
        session.invalid_rows().len()
    );
    io_utils::write_tables(args.output.as_deref(), editor.tables())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let tables = io_utils::read_tables(&args.input)?;
    for table_idx in selected_tables(args.table, tables.len()) {
        let table = tables.get(table_idx)?;
        let title = table
            .name
            .clone()
            .unwrap_or_else(|| format!("Table {}", table_idx + 1));
        println!("{title}");
        print!("{}", render::render_table(table, args.rows));
        println!();
    }
    Ok(())
}
