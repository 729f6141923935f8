mod common;

use anyhow::anyhow;
use common::{statement, strings, table};
use table_review::config::EditorConfig;
use table_review::remote::{NoRemote, SummaryRowService};
use table_review::similarity::is_likely_summary_context;
use table_review::summary::{
    DetectionSource, delete_summary_rows, detect_summary_rows_locally, mark_summary_row,
    resolve_detection, unmark_summary_row,
};

#[test]
fn local_detection_flags_total_row() {
    let t = table(&["Name", "Total"], &[&["Alice", "$100"], &["Total:", "$500"]]);
    assert_eq!(detect_summary_rows_locally(&t, &EditorConfig::default()), vec![1]);
}

#[test]
fn local_detection_accepts_plural_totals() {
    let t = table(
        &["Name", "Total"],
        &[&["Alice", "$100"], &["Totals", "$500"], &["Grand Totals:", "$500"]],
    );
    assert_eq!(detect_summary_rows_locally(&t, &EditorConfig::default()), vec![1, 2]);
    assert!(is_likely_summary_context(&strings(&["Totals", "$500"])));
}

#[test]
fn local_detection_flags_plural_subtotal_rows() {
    let t = table(
        &["Region", "Agent", "Premium"],
        &[
            &["East", "Alice", "$100"],
            &["Subtotals: East", "", "$100"],
            &["West", "Bob", "$80"],
            &["Region subtotals", "", "$80"],
        ],
    );
    assert_eq!(detect_summary_rows_locally(&t, &EditorConfig::default()), vec![1, 3]);
}

#[test]
fn marking_plural_totals_cascades_to_matching_rows() {
    let mut t = table(
        &["Name", "Paid"],
        &[
            &["Alice", "$100"],
            &["Totals: East", "$100"],
            &["Bob", "$5"],
            &["Totals: West", "$5"],
        ],
    );
    assert_eq!(mark_summary_row(&mut t, 1, 0.7).unwrap(), vec![1, 3]);
}

#[test]
fn local_detection_finds_subtotals_and_grand_total() {
    let tables = statement();
    assert_eq!(
        detect_summary_rows_locally(&tables.tables[0], &EditorConfig::default()),
        vec![2, 4, 5]
    );
}

#[test]
fn local_detection_ignores_keywords_inside_words() {
    let t = table(
        &["Account", "Premium", "Paid"],
        &[&["Accountant fees", "$10", "$5"], &["Summation Ltd", "$10", "$5"]],
    );
    assert!(detect_summary_rows_locally(&t, &EditorConfig::default()).is_empty());
}

#[test]
fn remote_answer_is_used_when_present() {
    let tables = statement();
    let outcome = resolve_detection(Ok(vec![5, 2, 2, 40]), &tables.tables[0], &EditorConfig::default());
    assert_eq!(outcome.source, DetectionSource::Remote);
    assert_eq!(outcome.rows, vec![2, 5]);
}

#[test]
fn remote_failure_or_empty_answer_falls_back_to_local() {
    let tables = statement();
    let config = EditorConfig::default();
    for response in [Err(anyhow!("timeout")), Ok(Vec::new()), Ok(vec![99])] {
        let outcome = resolve_detection(response, &tables.tables[0], &config);
        assert_eq!(outcome.source, DetectionSource::Local);
        assert_eq!(outcome.rows, vec![2, 4, 5]);
    }
    let t = &tables.tables[0];
    let outcome = resolve_detection(NoRemote.detect(&t.header, &t.row_values()), t, &config);
    assert_eq!(outcome.source, DetectionSource::Local);
}

#[test]
fn marking_a_subtotal_cascades_to_matching_subtotals() {
    let mut tables = statement();
    let t = &mut tables.tables[0];
    let added = mark_summary_row(t, 2, 0.7).unwrap();
    assert_eq!(added, vec![2, 4]);
    assert_eq!(t.summary_row_indices(), vec![2, 4]);
}

#[test]
fn marking_is_monotonic() {
    let mut tables = statement();
    let t = &mut tables.tables[0];
    t.flag_summary_row(5).unwrap();
    let added = mark_summary_row(t, 2, 0.7).unwrap();
    assert_eq!(added, vec![2, 4]);
    assert_eq!(t.summary_row_indices(), vec![2, 4, 5]);

    let again = mark_summary_row(t, 4, 0.7).unwrap();
    assert!(again.is_empty());
    assert_eq!(t.summary_row_indices(), vec![2, 4, 5]);
}

#[test]
fn marking_a_plain_row_uses_similarity_threshold() {
    let mut t = table(
        &["Agent", "Policy", "Rate"],
        &[&["Alice", "P-1", "5%"], &["Alice", "P-2", "5%"], &["Bob", "P-3", "4%"]],
    );
    assert_eq!(mark_summary_row(&mut t, 0, 0.6).unwrap(), vec![0, 1]);
    assert!(!t.is_summary_row(2));
}

#[test]
fn marking_out_of_range_row_fails_without_changes() {
    let mut tables = statement();
    let t = &mut tables.tables[0];
    assert!(mark_summary_row(t, 17, 0.7).is_err());
    assert!(!t.has_summary_rows());
}

#[test]
fn unmarking_does_not_cascade() {
    let mut tables = statement();
    let t = &mut tables.tables[0];
    mark_summary_row(t, 2, 0.7).unwrap();
    assert!(unmark_summary_row(t, 2).unwrap());
    assert_eq!(t.summary_row_indices(), vec![4]);
    assert!(!unmark_summary_row(t, 2).unwrap());
}

#[test]
fn deleting_summary_rows_keeps_detail_rows_in_order() {
    let mut tables = statement();
    let t = &mut tables.tables[0];
    t.set_summary_rows(&[2, 4, 5]);
    assert_eq!(delete_summary_rows(t), 3);
    let agents = t
        .rows()
        .iter()
        .map(|row| row.cells[1].as_str())
        .collect::<Vec<_>>();
    assert_eq!(agents, vec!["P-100", "P-101", "P-200"]);
    assert!(!t.has_summary_rows());
}

#[test]
fn deleting_with_no_flags_is_a_no_op() {
    let mut tables = statement();
    let before = tables.clone();
    assert_eq!(delete_summary_rows(&mut tables.tables[0]), 0);
    assert_eq!(tables, before);
}
