use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input data found in {0}")]
    NoInputData(PathBuf),

    #[error("no input data: no attendance records to aggregate")]
    EmptyRecords,

    #[error("{path}: missing required column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}: malformed row: {source}")]
    MalformedRow {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: unreadable workbook: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("{path}: workbook has no worksheets")]
    NoWorksheet { path: PathBuf },

    #[error("{origin}: empty volunteer identifier")]
    EmptyVolunteerId { origin: String },

    #[error("{origin} ({volunteer_id}): unrecognised date `{value}`")]
    InvalidDate {
        origin: String,
        volunteer_id: String,
        value: String,
    },

    #[error("{origin} ({volunteer_id}): unparseable duration `{text}`")]
    UnparseableDuration {
        origin: String,
        volunteer_id: String,
        text: String,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
