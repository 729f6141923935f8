//! Resolution of AI-suggested field mappings against the database field list.
//!
//! For each extracted field the selected target is, in order of priority:
//! the user's explicit choice, the suggested `database_field_id` when it is
//! still a known field, a case-insensitive exact match on display name, a
//! substring match in either direction, and otherwise nothing (`""`).

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::remote::ResolvedMapping;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingAlternative {
    pub field: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub extracted_field: String,
    pub mapped_to: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<MappingAlternative>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseField {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    UserSelection,
    SuggestedId,
    ExactName,
    FuzzyName,
    Unresolved,
}

/// Selected field id and the rule that produced it.
pub fn resolve_with_reason(
    mapping: &FieldMapping,
    user_selection: Option<&str>,
    database_fields: &[DatabaseField],
) -> (String, Resolution) {
    if let Some(selection) = user_selection.filter(|s| !s.is_empty()) {
        return (selection.to_string(), Resolution::UserSelection);
    }

    if let Some(id) = mapping.database_field_id.as_deref()
        && database_fields.iter().any(|field| field.id == id)
    {
        return (id.to_string(), Resolution::SuggestedId);
    }

    let suggested = mapping.mapped_to.trim().to_lowercase();
    if suggested.is_empty() {
        return (String::new(), Resolution::Unresolved);
    }

    if let Some(field) = database_fields
        .iter()
        .find(|field| field.display_name.trim().to_lowercase() == suggested)
    {
        return (field.id.clone(), Resolution::ExactName);
    }

    if let Some(field) = database_fields.iter().find(|field| {
        let display = field.display_name.trim().to_lowercase();
        !display.is_empty() && (display.contains(&suggested) || suggested.contains(&display))
    }) {
        return (field.id.clone(), Resolution::FuzzyName);
    }

    (String::new(), Resolution::Unresolved)
}

pub fn resolve_selected_field(
    mapping: &FieldMapping,
    user_selection: Option<&str>,
    database_fields: &[DatabaseField],
) -> String {
    resolve_with_reason(mapping, user_selection, database_fields).0
}

pub fn resolve_all(
    mappings: &[FieldMapping],
    user_selections: &HashMap<String, String>,
    database_fields: &[DatabaseField],
) -> Vec<ResolvedMapping> {
    mappings
        .iter()
        .map(|mapping| {
            let selection = user_selections
                .get(&mapping.extracted_field)
                .map(String::as_str);
            ResolvedMapping {
                mapping: mapping.clone(),
                selected_field: resolve_selected_field(mapping, selection, database_fields),
            }
        })
        .collect()
}

/// Remembers the last resolution per extracted field so write-back happens only on change.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    previous: HashMap<String, String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `mapping` and returns the new field id if it differs from last time.
    pub fn update(
        &mut self,
        mapping: &FieldMapping,
        user_selection: Option<&str>,
        database_fields: &[DatabaseField],
    ) -> Option<String> {
        let (resolved, reason) = resolve_with_reason(mapping, user_selection, database_fields);
        let key = mapping.extracted_field.clone();
        if self.previous.get(&key) == Some(&resolved) {
            return None;
        }
        debug!(
            "Field '{}' now resolves to '{}' via {:?}",
            mapping.extracted_field, resolved, reason
        );
        self.previous.insert(key, resolved.clone());
        Some(resolved)
    }

    pub fn current(&self, extracted_field: &str) -> Option<&str> {
        self.previous.get(extracted_field).map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, name: &str) -> DatabaseField {
        DatabaseField {
            id: id.to_string(),
            display_name: name.to_string(),
            description: None,
        }
    }

    fn mapping(mapped_to: &str, id: Option<&str>) -> FieldMapping {
        FieldMapping {
            extracted_field: "Net Prem".to_string(),
            mapped_to: mapped_to.to_string(),
            confidence: 0.9,
            database_field_id: id.map(str::to_string),
            alternatives: None,
        }
    }

    #[test]
    fn stale_suggested_id_falls_through_to_name_match() {
        let fields = vec![field("7", "Net Premium")];
        assert_eq!(
            resolve_with_reason(&mapping("net premium", Some("99")), None, &fields),
            ("7".to_string(), Resolution::ExactName)
        );
    }

    #[test]
    fn empty_user_selection_does_not_win() {
        let fields = vec![field("7", "Net Premium")];
        assert_eq!(
            resolve_selected_field(&mapping("Net Premium", None), Some(""), &fields),
            "7"
        );
    }

    #[test]
    fn tracker_reports_changes_only() {
        let fields = vec![field("1", "Commission Amount")];
        let m = mapping("Commission", None);
        let mut tracker = SelectionTracker::new();
        assert_eq!(tracker.update(&m, None, &fields), Some("1".to_string()));
        assert_eq!(tracker.update(&m, None, &fields), None);
        assert_eq!(tracker.update(&m, Some("4"), &fields), Some("4".to_string()));
    }
}
