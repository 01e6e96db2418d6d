//! The update-operation builder family.
//!
//! [`UpdateOp`] pairs an error tag with a pure body transform and turns the
//! pair into a concrete, independently-usable update operation. All five
//! shipped operations share the same task scaffolding; they differ only in
//! the transform, and new shapes are added by registering a new transform.

use std::sync::Arc;

use bson::Document;
use doctask_core::Task;
use doctask_store::{DocumentStore, UpdateResult};
use tracing::debug;

use crate::error::{ErrorEnvelope, OpError};
use crate::transforms;

/// Pure transform from a caller-supplied update body to the operator
/// document sent to the store. Fixed at builder construction, never varying
/// per call.
pub type BodyTransform = fn(Document) -> Document;

/// A named update operation: error tag plus body transform.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOp {
    tag: &'static str,
    transform: BodyTransform,
}

impl UpdateOp {
    pub const fn new(tag: &'static str, transform: BodyTransform) -> Self {
        Self { tag, transform }
    }

    /// Tag used in the error envelope's name (`doctask.<tag>`) and code
    /// (`db_<tag>`).
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The operator document this operation would send for `body`.
    pub fn operator_doc(&self, body: Document) -> Document {
        (self.transform)(body)
    }

    /// Build the deferred update task.
    ///
    /// Each fork applies the transform, issues exactly one update call, and
    /// resolves with the store's native write result. On failure the
    /// envelope reports the *original* body, not the transformed operator
    /// document: the body is what the caller wrote, which is what matters
    /// when diagnosing.
    pub fn task(
        &self,
        store: Arc<dyn DocumentStore>,
        collection: &str,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        let tag = self.tag;
        let transform = self.transform;
        let collection = collection.to_string();
        let params = params.into();
        Task::new(move || {
            let store = Arc::clone(&store);
            let collection = collection.clone();
            let params = params.clone();
            let filter = filter.clone();
            let body = body.clone();
            async move {
                let operator = transform(body.clone());
                debug!(collection = %collection, op = tag, "update");
                store
                    .update(&collection, &filter, &operator, &params)
                    .await
                    .map_err(|error| {
                        OpError::Envelope(
                            ErrorEnvelope::new(error, format!("doctask.{tag}"), format!("db_{tag}"))
                                .with_update_obj(body),
                        )
                    })
            }
        })
    }
}

/// Plain field-set update; the body is the literal operator document.
pub const UPDATE_ONE: UpdateOp = UpdateOp::new("update_one", transforms::identity);

/// Append a single element per field.
pub const UPDATE_PUSH_ONE: UpdateOp = UpdateOp::new("update_push_one", transforms::push_one);

/// Append a single element per field, skipping values already present.
pub const UPDATE_PUSH_ONE_TO_SET: UpdateOp =
    UpdateOp::new("update_push_one_to_set", transforms::push_one_to_set);

/// Batch-append an array of elements per field.
pub const UPDATE_PUSH_MANY: UpdateOp = UpdateOp::new("update_push_many", transforms::push_many);

/// Batch-append without duplicates.
pub const UPDATE_PUSH_MANY_TO_SET: UpdateOp =
    UpdateOp::new("update_push_many_to_set", transforms::push_many_to_set);
