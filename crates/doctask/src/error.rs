use bson::Document;
use doctask_store::StoreError;
use thiserror::Error;

use crate::registry::OpName;

/// Enriched failure produced by select operations.
///
/// Carries a stable dotted operation name, a per-operation code, and the
/// caller's original input for diagnosis: the update family reports the
/// update body *before* its operator transform (that is what the caller
/// wrote), single-document inserts report the document, and deletes carry
/// neither.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{fn_name} failed ({code}): {error}")]
pub struct ErrorEnvelope {
    /// The underlying store failure, unmodified.
    pub error: StoreError,
    /// Dotted operation name, e.g. `doctask.update_one`.
    pub fn_name: String,
    /// Stable operation code, e.g. `db_update_one`.
    pub code: String,
    /// Original update body, pre-transform (update family only).
    pub update_obj: Option<Document>,
    /// Document that failed to insert (single-document insert only).
    pub doc: Option<Document>,
}

impl ErrorEnvelope {
    pub fn new(error: StoreError, fn_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error,
            fn_name: fn_name.into(),
            code: code.into(),
            update_obj: None,
            doc: None,
        }
    }

    pub fn with_update_obj(mut self, body: Document) -> Self {
        self.update_obj = Some(body);
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.doc = Some(doc);
        self
    }
}

/// Failure of an operation task.
///
/// Which operations enrich and which forward raw is observed behavior and
/// is kept exactly: find, batch insert, connect, and index setup forward the
/// raw store error; single insert, the update family, delete, and lookup
/// wrap it in an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// Raw store failure, forwarded unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Enriched failure with operation name, code, and original input.
    #[error(transparent)]
    Envelope(#[from] ErrorEnvelope),

    /// The operation was not part of the requested task-set subset.
    #[error("operation {0} is not in this task set")]
    NotRegistered(OpName),
}

impl OpError {
    /// The underlying store error, whichever side of the enrichment split
    /// the operation sits on.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            OpError::Store(e) => Some(e),
            OpError::Envelope(env) => Some(&env.error),
            OpError::NotRegistered(_) => None,
        }
    }
}

/// Result alias for operation outcomes.
pub type OpResult<T> = Result<T, OpError>;
