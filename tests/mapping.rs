use std::collections::HashMap;

use table_review::mapping::{
    DatabaseField, FieldMapping, MappingAlternative, Resolution, SelectionTracker, resolve_all,
    resolve_selected_field, resolve_with_reason,
};

fn fields() -> Vec<DatabaseField> {
    vec![
        DatabaseField {
            id: "3".to_string(),
            display_name: "Policy Number".to_string(),
            description: Some("Carrier policy identifier".to_string()),
        },
        DatabaseField {
            id: "7".to_string(),
            display_name: "Net Premium".to_string(),
            description: None,
        },
        DatabaseField {
            id: "9".to_string(),
            display_name: "Commission Rate".to_string(),
            description: None,
        },
    ]
}

fn suggestion(extracted: &str, mapped_to: &str, id: Option<&str>) -> FieldMapping {
    FieldMapping {
        extracted_field: extracted.to_string(),
        mapped_to: mapped_to.to_string(),
        confidence: 0.82,
        database_field_id: id.map(str::to_string),
        alternatives: None,
    }
}

#[test]
fn suggested_name_resolves_by_exact_match() {
    let mapping = suggestion("Net Prem", "Net Premium", None);
    assert_eq!(resolve_selected_field(&mapping, None, &fields()), "7");
}

#[test]
fn user_selection_beats_every_suggestion() {
    let mapping = suggestion("Net Prem", "Net Premium", Some("7"));
    assert_eq!(
        resolve_with_reason(&mapping, Some("3"), &fields()),
        ("3".to_string(), Resolution::UserSelection)
    );
}

#[test]
fn known_suggested_id_beats_name_matching() {
    let mapping = suggestion("Rate", "Net Premium", Some("9"));
    assert_eq!(
        resolve_with_reason(&mapping, None, &fields()),
        ("9".to_string(), Resolution::SuggestedId)
    );
}

#[test]
fn name_match_ignores_case_and_padding() {
    let mapping = suggestion("Policy", "  policy NUMBER ", None);
    assert_eq!(
        resolve_with_reason(&mapping, None, &fields()),
        ("3".to_string(), Resolution::ExactName)
    );
}

#[test]
fn substring_match_works_in_both_directions() {
    let shorter = suggestion("Comm", "commission", None);
    assert_eq!(
        resolve_with_reason(&shorter, None, &fields()),
        ("9".to_string(), Resolution::FuzzyName)
    );
    let longer = suggestion("Premium", "Net Premium Amount", None);
    assert_eq!(
        resolve_with_reason(&longer, None, &fields()),
        ("7".to_string(), Resolution::FuzzyName)
    );
}

#[test]
fn unmatched_suggestion_resolves_to_empty() {
    for mapped_to in ["Agent Name", ""] {
        let mapping = suggestion("Agent", mapped_to, None);
        assert_eq!(
            resolve_with_reason(&mapping, None, &fields()),
            (String::new(), Resolution::Unresolved)
        );
    }
}

#[test]
fn resolve_all_uses_per_field_user_selections() {
    let mappings = vec![
        suggestion("Net Prem", "Net Premium", None),
        suggestion("Policy", "Policy Number", None),
    ];
    let mut selections = HashMap::new();
    selections.insert("Policy".to_string(), "9".to_string());

    let resolved = resolve_all(&mappings, &selections, &fields());
    let selected = resolved
        .iter()
        .map(|r| r.selected_field.as_str())
        .collect::<Vec<_>>();
    assert_eq!(selected, vec!["7", "9"]);
    assert_eq!(resolved[1].mapping, mappings[1]);
}

#[test]
fn mapping_json_accepts_optional_fields() {
    let raw = r#"{
        "extracted_field": "Rate",
        "mapped_to": "Commission Rate",
        "confidence": 0.64,
        "alternatives": [{"field": "Net Premium", "confidence": 0.2}]
    }"#;
    let mapping: FieldMapping = serde_json::from_str(raw).expect("parse mapping");
    assert_eq!(mapping.database_field_id, None);
    assert_eq!(
        mapping.alternatives,
        Some(vec![MappingAlternative {
            field: "Net Premium".to_string(),
            confidence: 0.2,
        }])
    );
    assert_eq!(resolve_selected_field(&mapping, None, &fields()), "9");
}

#[test]
fn tracker_remembers_each_field_separately() {
    let mut tracker = SelectionTracker::new();
    let premium = suggestion("Net Prem", "Net Premium", None);
    let policy = suggestion("Policy", "Policy Number", None);

    assert_eq!(tracker.update(&premium, None, &fields()), Some("7".to_string()));
    assert_eq!(tracker.update(&policy, None, &fields()), Some("3".to_string()));
    assert_eq!(tracker.update(&premium, None, &fields()), None);
    assert_eq!(tracker.current("Policy"), Some("3"));

    tracker.reset();
    assert_eq!(tracker.current("Policy"), None);
    assert_eq!(tracker.update(&policy, None, &fields()), Some("3".to_string()));
}
