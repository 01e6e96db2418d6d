//! Store-collaborator contract for the doctask adapter.
//!
//! The adapter layer never talks to a concrete database; it goes through the
//! [`DocumentStore`] trait, which carries the per-collection operations a
//! document database driver exposes (find, insert, update, delete, aggregate,
//! index creation). Connection acquisition goes through [`Connector`], one
//! attempt per call, no pooling.
//!
//! # Backends
//!
//! - [`MemoryStore`] -- a hermetic in-memory backend for tests and embedding,
//!   reachable through [`MemoryConnector`] with `memdb://host/<database>`
//!   URLs. It interprets equality filters, the `$set`/`$push`/`$addToSet`
//!   update operators (with `$each` batches and dotted field paths), upsert
//!   and multi parameters, unique indexes, and single-stage `$lookup`
//!   aggregation.
//!
//! # Design Rules
//!
//! 1. Result shapes are the driver's native acknowledgements (matched and
//!    modified counts, inserted ids, index counts); nothing normalizes them.
//! 2. Errors are reported, never retried or swallowed.
//! 3. The store owns all interpretation of filter, operator, and parameter
//!    documents; callers forward them verbatim.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

mod query;
mod update;

pub use error::{StoreError, StoreResult, DUPLICATE_KEY_CODE};
pub use memory::{MemoryConnector, MemoryStore};
pub use traits::{Connector, DocumentStore};
pub use types::{
    CreateIndexesResult, DeleteResult, IndexSpec, InsertManyResult, InsertOneResult, UpdateParams,
    UpdateResult,
};
