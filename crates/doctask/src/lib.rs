//! Deferred, lazily-forked operations over a document store.
//!
//! doctask wraps the per-collection operations of a document database in
//! [`Task`] values: cheap descriptions of a single store call that run
//! nothing until forked, and re-run from scratch on every fork. The store
//! itself sits behind the [`DocumentStore`] trait from `doctask-store`;
//! handles are acquired through [`connect`] and threaded by value into every
//! operation.
//!
//! The centerpiece is the update-operation builder: [`UpdateOp`] pairs an
//! error tag with a pure body transform and yields a concrete operation, so
//! the five shipped update shapes ([`UPDATE_ONE`], [`UPDATE_PUSH_ONE`],
//! [`UPDATE_PUSH_ONE_TO_SET`], [`UPDATE_PUSH_MANY`],
//! [`UPDATE_PUSH_MANY_TO_SET`]) share one piece of scaffolding and differ
//! only in their transform.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bson::doc;
//! use doctask::{connect, TaskSet, UpdateParams};
//! use doctask_store::{Connector, MemoryConnector};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), doctask::OpError> {
//! let connector: Arc<dyn Connector> = Arc::new(MemoryConnector::new());
//! let store = connect(connector, "memdb://localhost/app").run().await?;
//!
//! let users = TaskSet::init(store, "users", &[]);
//! users.insert_one(doc! { "user": "diego" }).run().await?;
//! users
//!     .update_push_one(
//!         UpdateParams::default(),
//!         doc! { "user": "diego" },
//!         doc! { "roles": "admin" },
//!     )
//!     .run()
//!     .await?;
//!
//! let found = users.find_in(doc! { "user": "diego" }).run().await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Error reporting
//!
//! Single inserts, the update family, deletes, and lookups enrich failures
//! into an [`ErrorEnvelope`] carrying a stable operation name, a code, and
//! the caller's original input; find, batch insert, connect, and index
//! setup forward the raw store error. That split is observed behavior of
//! the adapter and is kept exactly.

pub mod error;
pub mod ops;
pub mod registry;
pub mod transforms;
pub mod update;

pub use doctask_core::Task;
pub use doctask_store::{DocumentStore, UpdateParams};
pub use error::{ErrorEnvelope, OpError, OpResult};
pub use ops::{
    connect, delete_in_one, find_in, insert_many, insert_one, lookup, setup_unique_fields,
};
pub use registry::{OpName, TaskSet};
pub use update::{
    BodyTransform, UpdateOp, UPDATE_ONE, UPDATE_PUSH_MANY, UPDATE_PUSH_MANY_TO_SET,
    UPDATE_PUSH_ONE, UPDATE_PUSH_ONE_TO_SET,
};
