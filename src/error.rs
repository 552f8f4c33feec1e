use thiserror::Error;

/// Classified failures raised by the detection, parsing, and transformation
/// surfaces. Validation problems carry enough context for a caller to correct
/// the input and retry; everything else is fatal to the single operation only.
#[derive(Debug, Error)]
pub enum TablecastError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("'between' filter on column '{column}' requires a two-element array value")]
    BetweenValueNotArray { column: String },

    #[error("unknown sample type '{0}'")]
    UnknownSampleType(String),

    #[error("sample interval must be at least 1")]
    InvalidSampleInterval,

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("columns not found: {}", .0.join(", "))]
    ColumnsNotFound(Vec<String>),

    #[error("invalid date format: {0}")]
    InvalidDate(String),

    #[error("invalid command: {message}")]
    InvalidCommand {
        message: String,
        suggestions: Vec<String>,
    },
}

impl TablecastError {
    /// Stable machine code for protocol callers that match on error kinds
    /// rather than message text.
    pub fn code(&self) -> &'static str {
        match self {
            TablecastError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            TablecastError::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            TablecastError::BetweenValueNotArray { .. } => "BETWEEN_VALUE_NOT_ARRAY",
            TablecastError::UnknownSampleType(_) => "UNKNOWN_SAMPLE_TYPE",
            TablecastError::InvalidSampleInterval => "INVALID_SAMPLE_INTERVAL",
            TablecastError::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            TablecastError::ColumnsNotFound(_) => "COLUMNS_NOT_FOUND",
            TablecastError::InvalidDate(_) => "INVALID_DATE",
            TablecastError::InvalidCommand { .. } => "INVALID_COMMAND",
        }
    }
}

pub type Result<T> = std::result::Result<T, TablecastError>;
