use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;

use crate::error::StoreResult;
use crate::types::{
    CreateIndexesResult, DeleteResult, IndexSpec, InsertManyResult, InsertOneResult, UpdateResult,
};

/// Per-collection operations of a document database driver.
///
/// All implementations must satisfy these invariants:
/// - Each method performs exactly one store call; no retries, no batching
///   beyond what the method name says.
/// - Filters, operator documents, and parameter documents arrive verbatim
///   from the caller; the store owns their interpretation.
/// - `find` and `aggregate` return documents in the store's natural order.
/// - Failures are reported through `Err`, never swallowed.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// All documents matching `filter`, in natural order.
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>>;

    /// Insert one document, generating an `_id` when absent.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<InsertOneResult>;

    /// Insert documents in order; stops at the first failure.
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> StoreResult<InsertManyResult>;

    /// Apply `operator` to documents matching `filter`, under `params`
    /// (`upsert`, `multi`).
    async fn update(
        &self,
        collection: &str,
        filter: &Document,
        operator: &Document,
        params: &Document,
    ) -> StoreResult<UpdateResult>;

    /// Delete at most one matching document.
    async fn delete_one(&self, collection: &str, filter: &Document) -> StoreResult<DeleteResult>;

    /// Run an aggregation pipeline against `collection`.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> StoreResult<Vec<Document>>;

    /// Create the given indexes on `collection`.
    async fn create_indexes(
        &self,
        collection: &str,
        specs: &[IndexSpec],
    ) -> StoreResult<CreateIndexesResult>;
}

/// Connection acquisition seam.
///
/// One connect attempt per call; lifecycle management (pooling, reconnects)
/// belongs to the backend or the caller, never to this trait.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> StoreResult<Arc<dyn DocumentStore>>;
}
