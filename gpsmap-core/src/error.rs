//! Data-quality errors for individual location records.

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("invalid {field}: '{value}' is not a finite number")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("invalid timestamp: '{}'", .0)]
    InvalidTimestamp(String),
}
