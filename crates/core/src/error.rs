use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("uploaded data is empty")]
    EmptyInput,
    #[error("malformed CSV: {total} error(s)")]
    MalformedCsv { total: usize, examples: Vec<String> },
    #[error("unsupported import type {0:?} (expected results | variables)")]
    UnsupportedKind(String),
    #[error("row {row}: column {column} is not a valid number: {value:?}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("authentication required")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<rusqlite::Error> for CoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(value.to_string())
    }
}
