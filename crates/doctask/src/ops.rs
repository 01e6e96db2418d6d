//! The non-update operations: connect, find, insert, delete, join, indexes.
//!
//! Every constructor returns a lazy [`Task`] that issues exactly one store
//! call per fork. Which operations enrich their failures and which forward
//! the raw store error is observed behavior, kept exactly (see
//! [`crate::error`]).

use std::sync::Arc;

use bson::{doc, Document};
use doctask_core::Task;
use doctask_store::{
    Connector, CreateIndexesResult, DeleteResult, DocumentStore, IndexSpec, InsertManyResult,
    InsertOneResult,
};
use tracing::debug;

use crate::error::{ErrorEnvelope, OpError};

/// One connect attempt per fork. Raw error passthrough; no retry, no
/// pooling.
pub fn connect(
    connector: Arc<dyn Connector>,
    url: &str,
) -> Task<OpError, Arc<dyn DocumentStore>> {
    let url = url.to_string();
    Task::new(move || {
        let connector = Arc::clone(&connector);
        let url = url.clone();
        async move {
            debug!(url = %url, "connect");
            connector.connect(&url).await.map_err(OpError::from)
        }
    })
}

/// All documents matching `filter`, in the store's natural order. Raw error
/// passthrough.
pub fn find_in(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    filter: Document,
) -> Task<OpError, Vec<Document>> {
    let collection = collection.to_string();
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let filter = filter.clone();
        async move {
            debug!(collection = %collection, "find");
            store.find(&collection, &filter).await.map_err(OpError::from)
        }
    })
}

/// Insert one document. Failures are enveloped with the offending document.
pub fn insert_one(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    doc: Document,
) -> Task<OpError, InsertOneResult> {
    let collection = collection.to_string();
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let doc = doc.clone();
        async move {
            debug!(collection = %collection, "insert one");
            store
                .insert_one(&collection, doc.clone())
                .await
                .map_err(|error| {
                    OpError::Envelope(
                        ErrorEnvelope::new(error, "doctask.insert_one", "db_insert_one")
                            .with_doc(doc),
                    )
                })
        }
    })
}

/// Insert a batch of documents. Raw error passthrough, unlike
/// [`insert_one`].
pub fn insert_many(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    docs: Vec<Document>,
) -> Task<OpError, InsertManyResult> {
    let collection = collection.to_string();
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let docs = docs.clone();
        async move {
            debug!(collection = %collection, count = docs.len(), "insert many");
            store
                .insert_many(&collection, docs)
                .await
                .map_err(OpError::from)
        }
    })
}

/// Delete at most one matching document. Enveloped without a body field,
/// and with the bare code `delete_one`.
pub fn delete_in_one(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    filter: Document,
) -> Task<OpError, DeleteResult> {
    let collection = collection.to_string();
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let filter = filter.clone();
        async move {
            debug!(collection = %collection, "delete one");
            store
                .delete_one(&collection, &filter)
                .await
                .map_err(|error| {
                    OpError::Envelope(ErrorEnvelope::new(
                        error,
                        "doctask.delete_in_one",
                        "delete_one",
                    ))
                })
        }
    })
}

/// Left outer join: attach to every document of `collection` an array field
/// `output_field` holding the documents of `joined_collection` whose
/// `related_fields[1]` equals the source's `related_fields[0]` (empty array
/// when nothing matches).
pub fn lookup(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    joined_collection: &str,
    related_fields: [&str; 2],
    output_field: &str,
) -> Task<OpError, Vec<Document>> {
    let collection = collection.to_string();
    let stage = doc! { "$lookup": {
        "from": joined_collection,
        "localField": related_fields[0],
        "foreignField": related_fields[1],
        "as": output_field,
    }};
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let stage = stage.clone();
        async move {
            debug!(collection = %collection, "lookup");
            store
                .aggregate(&collection, &[stage])
                .await
                .map_err(|error| {
                    OpError::Envelope(ErrorEnvelope::new(error, "doctask.lookup", "join"))
                })
        }
    })
}

/// Create one unique, named index per field (index name equals field name).
/// Raw error passthrough.
pub fn setup_unique_fields(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    fields: &[&str],
) -> Task<OpError, CreateIndexesResult> {
    let collection = collection.to_string();
    let specs: Vec<IndexSpec> = fields.iter().map(|f| IndexSpec::unique_on(f)).collect();
    Task::new(move || {
        let store = Arc::clone(&store);
        let collection = collection.clone();
        let specs = specs.clone();
        async move {
            debug!(collection = %collection, count = specs.len(), "create indexes");
            store
                .create_indexes(&collection, &specs)
                .await
                .map_err(OpError::from)
        }
    })
}
