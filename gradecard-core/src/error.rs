use thiserror::Error;

/// Document-level failures. Anything that can go wrong for a single student
/// block is reported as a `StructuralMismatch` value instead, so one bad
/// block never aborts a document.
#[derive(Debug, Error)]
pub enum GradecardError {
    #[error("document has no pages")]
    EmptyDocument,

    #[error("no subject rows found in the first-page course table")]
    EmptyCatalog,

    #[error("course {code}: {field} value {value:?} is not a number")]
    CatalogField {
        code: String,
        field: &'static str,
        value: String,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("no student with seat number {0}")]
    UnknownSeat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type GradecardResult<T> = std::result::Result<T, GradecardError>;
