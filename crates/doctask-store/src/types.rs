use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// Acknowledgement for a single-document insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOneResult {
    /// `_id` of the inserted document (generated when absent).
    pub inserted_id: Bson,
}

/// Acknowledgement for a batch insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertManyResult {
    pub inserted_count: u64,
    /// Ids in insertion order.
    pub inserted_ids: Vec<Bson>,
}

/// Acknowledgement for an update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed. An idempotent `$addToSet` that finds its
    /// value already present matches without modifying.
    pub modified_count: u64,
    /// `_id` of the document inserted by an upsert, when one happened.
    pub upserted_id: Option<Bson>,
}

/// Acknowledgement for a single-document delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Acknowledgement for index creation.
///
/// Index counts include the implicit `_id` index, matching the driver's
/// reporting convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexesResult {
    pub created_collection_automatically: bool,
    pub num_indexes_before: u64,
    pub num_indexes_after: u64,
    /// Names of the indexes created by this call.
    pub index_names: Vec<String>,
}

/// Wire shape of one index specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed fields with sort direction, e.g. `{username: 1}`.
    pub key: Document,
    pub name: String,
    pub unique: bool,
}

impl IndexSpec {
    /// A unique ascending index on a single field, named after the field.
    pub fn unique_on(field: &str) -> Self {
        Self {
            key: doc! { field: 1 },
            name: field.to_string(),
            unique: true,
        }
    }
}

/// Typed form of the opaque parameter document forwarded with update calls.
///
/// The store reads the parameter document, not this struct; it exists so
/// callers get field names checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateParams {
    /// Insert a new document when the filter matches nothing.
    pub upsert: bool,
    /// Update every match instead of the first.
    pub multi: bool,
}

impl UpdateParams {
    pub fn upsert() -> Self {
        Self {
            upsert: true,
            multi: false,
        }
    }

    pub fn multi() -> Self {
        Self {
            upsert: false,
            multi: true,
        }
    }
}

impl From<UpdateParams> for Document {
    fn from(params: UpdateParams) -> Self {
        doc! { "upsert": params.upsert, "multi": params.multi }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_spec_shape() {
        let spec = IndexSpec::unique_on("username");
        assert_eq!(spec.key, doc! { "username": 1 });
        assert_eq!(spec.name, "username");
        assert!(spec.unique);
    }

    #[test]
    fn update_params_to_document() {
        let params: Document = UpdateParams::upsert().into();
        assert_eq!(params, doc! { "upsert": true, "multi": false });

        let defaults: Document = UpdateParams::default().into();
        assert_eq!(defaults, doc! { "upsert": false, "multi": false });
    }
}
