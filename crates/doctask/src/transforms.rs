//! Pure update-body transforms.
//!
//! Each transform takes the caller's update body and produces the operator
//! document actually sent to the store. They contain no I/O and no error
//! handling; new update shapes are added here, never by duplicating the
//! task scaffolding in [`crate::update`].

use bson::{doc, Bson, Document};

/// The body is already the operator document (plain field-set semantics).
pub fn identity(body: Document) -> Document {
    body
}

/// Append one element per field: `{$push: body}`.
pub fn push_one(body: Document) -> Document {
    doc! { "$push": body }
}

/// Append one element per field unless already present: `{$addToSet: body}`.
pub fn push_one_to_set(body: Document) -> Document {
    doc! { "$addToSet": body }
}

/// Batch-append: each field's value is an array of elements, wrapped in a
/// `$each` clause so the store appends them in one call.
pub fn push_many(body: Document) -> Document {
    doc! { "$push": each_wrapped(body) }
}

/// Batch-append without duplicates.
pub fn push_many_to_set(body: Document) -> Document {
    doc! { "$addToSet": each_wrapped(body) }
}

/// Wrap every field value of `body` in a `$each` batch clause. The values
/// are passed through verbatim; the store rejects non-array batches.
pub fn each_wrapped(body: Document) -> Document {
    body.into_iter()
        .map(|(field, value)| (field, Bson::Document(doc! { "$each": value })))
        .collect()
}
