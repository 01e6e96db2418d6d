use thiserror::Error;

/// Driver error code reported for unique-index violations.
pub const DUPLICATE_KEY_CODE: u32 = 11000;

/// Errors surfaced by a document store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An insert violated a unique index.
    #[error("duplicate key in {collection}: index {index} (code {DUPLICATE_KEY_CODE})")]
    DuplicateKey { collection: String, index: String },

    /// An array operator targeted a field holding a non-array value.
    #[error("field {path} is not an array")]
    NotAnArray { path: String },

    /// A dotted path descended through a field holding a non-document value.
    #[error("field {path} is not a document")]
    NotADocument { path: String },

    /// A `$each` clause held something other than an array.
    #[error("$each value for {path} must be an array")]
    EachNotArray { path: String },

    /// The update operator document used an operator the backend does not know.
    #[error("unsupported update operator {0}")]
    UnsupportedOperator(String),

    /// The aggregation pipeline was empty, malformed, or used an unknown stage.
    #[error("invalid aggregation pipeline: {0}")]
    InvalidPipeline(String),

    /// The connection URL could not be parsed for this backend.
    #[error("invalid connection url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl StoreError {
    /// Numeric driver error code, where the failure carries one.
    pub fn code(&self) -> Option<u32> {
        match self {
            StoreError::DuplicateKey { .. } => Some(DUPLICATE_KEY_CODE),
            _ => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
