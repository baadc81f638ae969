// Error types shared by the scanner, materializers and writer

use thiserror::Error;

/// Errors raised while configuring, scanning or writing delimited text.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Structural violation found while scanning. Fatal to the scan.
    #[error("malformed input at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A field could not be cast to its declared type. Fatal to the row.
    #[error("line {line}, column {column}: {source}")]
    Conversion {
        line: usize,
        column: usize,
        #[source]
        source: ConversionError,
    },

    /// Invalid option combination or unresolvable schema.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// I/O failure from the wrapped stream, passed through unmodified.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CsvError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        CsvError::Malformed {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        CsvError::Configuration(reason.into())
    }
}

/// A single field failed to cast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{value}' to {expected}: {reason}")]
pub struct ConversionError {
    pub value: String,
    pub expected: &'static str,
    pub reason: String,
}

impl ConversionError {
    pub(crate) fn new(value: &str, expected: &'static str, reason: impl ToString) -> Self {
        ConversionError {
            value: value.to_string(),
            expected,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CsvError>;
