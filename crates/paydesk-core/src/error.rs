//! Error types module
//!
//! Every fallible operation in the core returns one of the small enums below.
//! None of them is fatal: period and filter errors are local precondition
//! violations that leave state untouched, and store errors only affect the
//! write being attempted.

use uuid::Uuid;

use crate::filters::FilterOperator;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for user actions that were refused
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be reported to the user and the logs.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INCOMPLETE_DRAFT")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Message suitable for a user-facing notice
    fn client_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Invalid year: {0:?} (expected four digits)")]
    InvalidYear(String),

    #[error("Unknown month: {0:?}")]
    UnknownMonth(String),

    #[error("Week ordinal {0} out of range (expected 1..=5)")]
    WeekOutOfRange(u32),

    #[error("Invalid period key: {0:?}")]
    InvalidKey(String),

    #[error("Date out of range: {year}-{month:02}")]
    DateOutOfRange { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("No filter is being added or edited")]
    NoDraft,

    #[error("Filter needs both a field and a value")]
    IncompleteDraft,

    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(Uuid),

    #[error("Operator '{operator}' does not take this kind of value")]
    ValueShapeMismatch { operator: FilterOperator },

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("There are no active filters to save")]
    NoFilters,

    #[error("Preset name must not be empty")]
    EmptyName,

    #[error("Failed to persist presets: {0}")]
    Store(#[from] StoreError),
}

/// Umbrella error for callers that mix several core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorMetadata for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Period(PeriodError::InvalidYear(_)) => "INVALID_YEAR",
            CoreError::Period(PeriodError::UnknownMonth(_)) => "UNKNOWN_MONTH",
            CoreError::Period(PeriodError::WeekOutOfRange(_)) => "WEEK_OUT_OF_RANGE",
            CoreError::Period(PeriodError::InvalidKey(_)) => "INVALID_PERIOD_KEY",
            CoreError::Period(PeriodError::DateOutOfRange { .. }) => "DATE_OUT_OF_RANGE",
            CoreError::Filter(FilterError::NoDraft) => "NO_DRAFT",
            CoreError::Filter(FilterError::IncompleteDraft) => "INCOMPLETE_DRAFT",
            CoreError::Filter(FilterError::UnknownField(_)) => "UNKNOWN_FIELD",
            CoreError::Filter(FilterError::UnknownFilter(_)) => "UNKNOWN_FILTER",
            CoreError::Filter(FilterError::ValueShapeMismatch { .. }) => "VALUE_SHAPE_MISMATCH",
            CoreError::Filter(FilterError::UnknownOperator(_)) => "UNKNOWN_OPERATOR",
            CoreError::Preset(PresetError::NoFilters) => "NO_FILTERS",
            CoreError::Preset(PresetError::EmptyName) => "EMPTY_PRESET_NAME",
            CoreError::Preset(PresetError::Store(_)) | CoreError::Store(_) => "STORE_ERROR",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            CoreError::Period(_) => LogLevel::Debug,
            CoreError::Filter(_) => LogLevel::Debug,
            CoreError::Preset(PresetError::Store(_)) | CoreError::Store(_) => LogLevel::Error,
            CoreError::Preset(_) => LogLevel::Warn,
        }
    }

    fn client_message(&self) -> String {
        match self {
            CoreError::Preset(PresetError::Store(_)) | CoreError::Store(_) => {
                "Failed to save local settings".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_incomplete_draft() {
        let err = CoreError::from(FilterError::IncompleteDraft);
        assert_eq!(err.error_code(), "INCOMPLETE_DRAFT");
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.client_message(), "Filter needs both a field and a value");
    }

    #[test]
    fn test_error_metadata_no_filters() {
        let err = CoreError::from(PresetError::NoFilters);
        assert_eq!(err.error_code(), "NO_FILTERS");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_store_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/path");
        let err = CoreError::from(PresetError::from(StoreError::from(io)));
        assert_eq!(err.error_code(), "STORE_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(!err.client_message().contains("/secret/path"));
    }

    #[test]
    fn test_period_error_display() {
        assert_eq!(
            PeriodError::WeekOutOfRange(6).to_string(),
            "Week ordinal 6 out of range (expected 1..=5)"
        );
        assert_eq!(
            PeriodError::DateOutOfRange { year: 2025, month: 2 }.to_string(),
            "Date out of range: 2025-02"
        );
    }
}
