//! Error types surfaced to callers.
//!
//! `SchemaError` is fatal to a normalization call. Integrity and layout
//! problems are never errors; they travel inside the result.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("series: expected at least one series, got none")]
    NoSeries,

    #[error("series `{series}`: expected at least one value")]
    EmptySeries { series: String },

    #[error("series `{series}`: id is used more than once")]
    DuplicateSeries { series: String },

    #[error("series `{series}` value {index}: expected a finite number")]
    NonFinite { series: String, index: usize },

    #[error("series `{series}`: point and category values cannot be mixed")]
    MixedData { series: String },

    #[error("series `{series}`: {chart} charts share one scale, expected {expected} values, got {found}")]
    ArityMismatch {
        series: String,
        chart: String,
        expected: usize,
        found: usize,
    },

    #[error("series `{series}`: {chart} charts need at least {min} values")]
    TooFewValues {
        series: String,
        chart: String,
        min: usize,
    },

    #[error("{field}: references unknown series `{series}`")]
    UnknownSeries { field: String, series: String },

    #[error("series `{series}` color: expected #RRGGBB, got `{value}`")]
    InvalidColor { series: String, value: String },

    #[error("label_gap: expected a finite number > 0, got {value}")]
    InvalidGap { value: f64 },

    #[error("request_id: required when `confirmed` is set")]
    MissingRequestId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no override session for request `{request_id}`")]
    NotFound { request_id: String },

    #[error("override session for request `{request_id}` expired")]
    Expired { request_id: String },

    #[error("override session for request `{request_id}` is already confirmed")]
    AlreadyConfirmed { request_id: String },
}
