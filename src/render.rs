use std::borrow::Cow;
use std::fmt::Write as _;

use crate::table::Table;

pub const SUMMARY_MARKER: &str = "*";

pub fn render_table(table: &Table, max_rows: Option<usize>) -> String {
    let mut headers = Vec::with_capacity(table.column_count() + 1);
    headers.push("#".to_string());
    headers.extend(table.header.iter().cloned());

    let limit = max_rows.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    for (idx, row) in table.rows().iter().enumerate().take(limit) {
        let mut label = (idx + 1).to_string();
        if table.is_summary_row(idx) {
            label.push_str(SUMMARY_MARKER);
        }
        let mut cells = Vec::with_capacity(row.cells.len() + 1);
        cells.push(label);
        cells.extend(row.cells.iter().cloned());
        rows.push(cells);
    }

    let mut output = render_grid(&headers, &rows);
    if table.row_count() > limit {
        let _ = writeln!(output, "... {} more row(s)", table.row_count() - limit);
    }
    output
}

pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = flatten_whitespace(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn flatten_whitespace(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
