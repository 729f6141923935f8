mod common;

use common::{statement, strings, table};
use proptest::prelude::*;
use table_review::similarity::{
    contains_summary_keyword, find_similar_rows, is_likely_summary_context, similarity,
};

#[test]
fn similarity_ignores_case_and_padding() {
    let a = strings(&["Alice", "P-100", "5%"]);
    let b = strings(&[" alice", "P-100 ", "4%"]);
    assert!((similarity(&a, &b) - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn similarity_of_empty_or_mismatched_rows_is_zero() {
    assert_eq!(similarity(&[], &[]), 0.0);
    assert_eq!(similarity(&strings(&["a", "b"]), &strings(&["a"])), 0.0);
}

#[test]
fn keyword_detection_is_case_insensitive() {
    assert!(contains_summary_keyword("GRAND TOTAL"));
    assert!(contains_summary_keyword("net: 40"));
    assert!(!contains_summary_keyword("Totally unrelated"));
}

#[test]
fn summary_context_looks_at_first_three_cells() {
    assert!(is_likely_summary_context(&strings(&["East", "Subtotal", "", "$5"])));
    assert!(!is_likely_summary_context(&strings(&["East", "", "", "Subtotal"])));
}

#[test]
fn subtotals_group_together_but_not_with_grand_total() {
    let tables = statement();
    let t = &tables.tables[0];
    let target = t.row(2).unwrap().to_vec();
    assert_eq!(find_similar_rows(t, &target, 2, 0.7), vec![4]);

    let grand = t.row(5).unwrap().to_vec();
    assert!(find_similar_rows(t, &grand, 5, 0.7).is_empty());
}

#[test]
fn same_single_keyword_counts_as_shared_pattern() {
    let t = table(
        &["Label", "Amount"],
        &[&["East balance", "$5"], &["West balance", "$7"], &["Balance owed net", "$1"]],
    );
    let target = t.row(0).unwrap().to_vec();
    assert_eq!(find_similar_rows(&t, &target, 0, 0.7), vec![1]);
}

#[test]
fn detail_rows_match_by_threshold() {
    let t = table(
        &["Agent", "Carrier", "Rate", "Paid"],
        &[
            &["Alice", "Acme", "5%", "01/15/2024"],
            &["Alice", "Acme", "5%", "01/16/2024"],
            &["Alice", "Zenith", "4%", "01/16/2024"],
        ],
    );
    let target = t.row(0).unwrap().to_vec();
    assert_eq!(find_similar_rows(&t, &target, 0, 0.75), vec![1]);
    assert_eq!(find_similar_rows(&t, &target, 0, 0.25), vec![1, 2]);
}

proptest! {
    #[test]
    fn similarity_is_symmetric_and_bounded(
        a in prop::collection::vec("[a-c ]{0,3}", 1..6),
        b in prop::collection::vec("[a-c ]{0,3}", 1..6),
    ) {
        let forward = similarity(&a, &b);
        prop_assert_eq!(forward, similarity(&b, &a));
        prop_assert!((0.0..=1.0).contains(&forward));
    }

    #[test]
    fn a_row_is_fully_similar_to_itself(row in prop::collection::vec(".{0,8}", 1..6)) {
        prop_assert_eq!(similarity(&row, &row), 1.0);
    }
}
