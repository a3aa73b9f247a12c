//! Column filters for remote tables.
//!
//! A [`Filter`] is one field/operator/value chip. Filters are only state: the
//! server (or the table) does the actual filtering. [`FilterManager`] owns the
//! committed set and the draft used by the add/edit popup.

mod manager;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FilterError;

pub use manager::{EditorState, FilterManager, FilterSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "is not")]
    IsNot,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "has any value")]
    HasAnyValue,
    #[serde(rename = "is greater than")]
    IsGreaterThan,
    #[serde(rename = "is between")]
    IsBetween,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Is,
        FilterOperator::IsNot,
        FilterOperator::Contains,
        FilterOperator::HasAnyValue,
        FilterOperator::IsGreaterThan,
        FilterOperator::IsBetween,
    ];

    /// Label shown in the operator picker.
    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Is => "is",
            FilterOperator::IsNot => "is not",
            FilterOperator::Contains => "contains",
            FilterOperator::HasAnyValue => "has any value",
            FilterOperator::IsGreaterThan => "is greater than",
            FilterOperator::IsBetween => "is between",
        }
    }

    /// Short code used in list query strings.
    pub fn query_code(&self) -> &'static str {
        match self {
            FilterOperator::Is => "eq",
            FilterOperator::IsNot => "ne",
            FilterOperator::Contains => "like",
            FilterOperator::HasAnyValue => "exists",
            FilterOperator::IsGreaterThan => "gt",
            FilterOperator::IsBetween => "between",
        }
    }

    /// Whether the value is a `{min, max}` pair rather than a single string.
    pub fn takes_range(&self) -> bool {
        matches!(self, FilterOperator::IsBetween)
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    /// Accepts either the picker label or the query code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.label().eq_ignore_ascii_case(wanted) || op.query_code() == wanted)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    Range { min: String, max: String },
}

impl FilterValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FilterValue::Scalar(value.into())
    }

    pub fn range(min: impl Into<String>, max: impl Into<String>) -> Self {
        FilterValue::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    /// A range counts as empty when either bound is blank.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Scalar(value) => value.trim().is_empty(),
            FilterValue::Range { min, max } => min.trim().is_empty() || max.trim().is_empty(),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FilterValue::Range { .. })
    }
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FilterValue::Scalar(value) => f.write_str(value),
            FilterValue::Range { min, max } => write!(f, "{}..{}", min, max),
        }
    }
}

/// One committed filter chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: Uuid,
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl Filter {
    /// New filter with a fresh identifier.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            field: field.into(),
            operator,
            value,
        }
    }

    /// Same field, operator and value, ignoring identity.
    pub fn same_content(&self, other: &Filter) -> bool {
        self.field == other.field && self.operator == other.operator && self.value == other.value
    }
}

/// Uncommitted state of the add/edit popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDraft {
    pub field: Option<String>,
    pub operator: FilterOperator,
    pub value: Option<FilterValue>,
}

impl Default for FilterDraft {
    fn default() -> Self {
        Self {
            field: None,
            operator: FilterOperator::Is,
            value: None,
        }
    }
}

impl FilterDraft {
    pub fn from_filter(filter: &Filter) -> Self {
        Self {
            field: Some(filter.field.clone()),
            operator: filter.operator,
            value: Some(filter.value.clone()),
        }
    }

    /// Both a non-blank field and a non-empty value are present.
    pub fn is_complete(&self) -> bool {
        let has_field = self
            .field
            .as_deref()
            .is_some_and(|field| !field.trim().is_empty());
        let has_value = self.value.as_ref().is_some_and(|value| !value.is_empty());
        has_field && has_value
    }
}

/// The enumerated set of fields one table can be filtered on.
///
/// An empty schema accepts any field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSchema {
    fields: Vec<String>,
}

impl FilterSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn allows(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_labels_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(op.label().parse::<FilterOperator>().unwrap(), op);
            assert_eq!(op.query_code().parse::<FilterOperator>().unwrap(), op);
        }
        assert_eq!(
            "Is Not".parse::<FilterOperator>().unwrap(),
            FilterOperator::IsNot
        );
        assert!(matches!(
            "roughly".parse::<FilterOperator>(),
            Err(FilterError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_operator_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&FilterOperator::IsGreaterThan).unwrap(),
            "\"is greater than\""
        );
    }

    #[test]
    fn test_value_wire_shapes() {
        assert_eq!(
            serde_json::to_string(&FilterValue::scalar("Active")).unwrap(),
            "\"Active\""
        );
        assert_eq!(
            serde_json::to_string(&FilterValue::range("1", "9")).unwrap(),
            r#"{"min":"1","max":"9"}"#
        );
        let range: FilterValue = serde_json::from_str(r#"{"min":"a","max":"b"}"#).unwrap();
        assert_eq!(range, FilterValue::range("a", "b"));
    }

    #[test]
    fn test_value_emptiness() {
        assert!(FilterValue::scalar("  ").is_empty());
        assert!(!FilterValue::scalar("x").is_empty());
        assert!(FilterValue::range("1", "").is_empty());
        assert!(!FilterValue::range("1", "2").is_empty());
    }

    #[test]
    fn test_draft_completeness() {
        let mut draft = FilterDraft::default();
        assert!(!draft.is_complete());
        draft.field = Some("Status".to_string());
        assert!(!draft.is_complete());
        draft.value = Some(FilterValue::scalar(""));
        assert!(!draft.is_complete());
        draft.value = Some(FilterValue::scalar("Active"));
        assert!(draft.is_complete());
        draft.field = Some(" ".to_string());
        assert!(!draft.is_complete());
    }

    #[test]
    fn test_schema_allows() {
        let schema = FilterSchema::new(["Status", "Department"]);
        assert!(schema.allows("Status"));
        assert!(!schema.allows("Salary"));
        assert!(FilterSchema::any().allows("anything"));
    }
}
