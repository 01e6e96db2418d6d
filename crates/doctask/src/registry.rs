//! The bound task-set registry.
//!
//! [`TaskSet::init`] captures a store handle and a collection name once, so
//! call sites deal only in filters, bodies, and parameters. An empty request
//! enables the full registry of nine data operations; a non-empty request
//! enables exactly that subset, and the methods of everything else return a
//! task that rejects with [`OpError::NotRegistered`].

use std::collections::BTreeSet;
use std::sync::Arc;

use bson::Document;
use doctask_core::Task;
use doctask_store::{DeleteResult, DocumentStore, InsertManyResult, InsertOneResult, UpdateResult};

use crate::error::OpError;
use crate::ops;
use crate::update::{
    UpdateOp, UPDATE_ONE, UPDATE_PUSH_MANY, UPDATE_PUSH_MANY_TO_SET, UPDATE_PUSH_ONE,
    UPDATE_PUSH_ONE_TO_SET,
};

/// Names of the registrable data operations.
///
/// Connect, lookup, and index setup are deliberately not here; they bind to
/// more than a single collection's data path and stay free functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpName {
    FindIn,
    InsertOne,
    InsertMany,
    UpdateOne,
    UpdatePushOne,
    UpdatePushMany,
    UpdatePushOneToSet,
    UpdatePushManyToSet,
    DeleteInOne,
}

impl OpName {
    pub const ALL: [OpName; 9] = [
        OpName::FindIn,
        OpName::InsertOne,
        OpName::InsertMany,
        OpName::UpdateOne,
        OpName::UpdatePushOne,
        OpName::UpdatePushMany,
        OpName::UpdatePushOneToSet,
        OpName::UpdatePushManyToSet,
        OpName::DeleteInOne,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpName::FindIn => "find_in",
            OpName::InsertOne => "insert_one",
            OpName::InsertMany => "insert_many",
            OpName::UpdateOne => "update_one",
            OpName::UpdatePushOne => "update_push_one",
            OpName::UpdatePushMany => "update_push_many",
            OpName::UpdatePushOneToSet => "update_push_one_to_set",
            OpName::UpdatePushManyToSet => "update_push_many_to_set",
            OpName::DeleteInOne => "delete_in_one",
        }
    }
}

impl std::fmt::Display for OpName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store + collection bound over the operation registry.
pub struct TaskSet {
    store: Arc<dyn DocumentStore>,
    collection: String,
    enabled: BTreeSet<OpName>,
}

impl TaskSet {
    /// Bind `store` and `collection` over the requested operations.
    ///
    /// An empty `requested` slice enables the full registry.
    pub fn init(store: Arc<dyn DocumentStore>, collection: &str, requested: &[OpName]) -> Self {
        let enabled: BTreeSet<OpName> = if requested.is_empty() {
            OpName::ALL.into_iter().collect()
        } else {
            requested.iter().copied().collect()
        };
        Self {
            store,
            collection: collection.to_string(),
            enabled,
        }
    }

    /// Collection every operation of this set targets.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether an operation is part of this set.
    pub fn contains(&self, op: OpName) -> bool {
        self.enabled.contains(&op)
    }

    /// Enabled operations, in registry order.
    pub fn ops(&self) -> Vec<OpName> {
        OpName::ALL
            .into_iter()
            .filter(|op| self.enabled.contains(op))
            .collect()
    }

    pub fn find_in(&self, filter: Document) -> Task<OpError, Vec<Document>> {
        if !self.contains(OpName::FindIn) {
            return unregistered(OpName::FindIn);
        }
        ops::find_in(Arc::clone(&self.store), &self.collection, filter)
    }

    pub fn insert_one(&self, doc: Document) -> Task<OpError, InsertOneResult> {
        if !self.contains(OpName::InsertOne) {
            return unregistered(OpName::InsertOne);
        }
        ops::insert_one(Arc::clone(&self.store), &self.collection, doc)
    }

    pub fn insert_many(&self, docs: Vec<Document>) -> Task<OpError, InsertManyResult> {
        if !self.contains(OpName::InsertMany) {
            return unregistered(OpName::InsertMany);
        }
        ops::insert_many(Arc::clone(&self.store), &self.collection, docs)
    }

    pub fn update_one(
        &self,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        self.update_with(OpName::UpdateOne, UPDATE_ONE, params.into(), filter, body)
    }

    pub fn update_push_one(
        &self,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        self.update_with(
            OpName::UpdatePushOne,
            UPDATE_PUSH_ONE,
            params.into(),
            filter,
            body,
        )
    }

    pub fn update_push_many(
        &self,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        self.update_with(
            OpName::UpdatePushMany,
            UPDATE_PUSH_MANY,
            params.into(),
            filter,
            body,
        )
    }

    pub fn update_push_one_to_set(
        &self,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        self.update_with(
            OpName::UpdatePushOneToSet,
            UPDATE_PUSH_ONE_TO_SET,
            params.into(),
            filter,
            body,
        )
    }

    pub fn update_push_many_to_set(
        &self,
        params: impl Into<Document>,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        self.update_with(
            OpName::UpdatePushManyToSet,
            UPDATE_PUSH_MANY_TO_SET,
            params.into(),
            filter,
            body,
        )
    }

    pub fn delete_in_one(&self, filter: Document) -> Task<OpError, DeleteResult> {
        if !self.contains(OpName::DeleteInOne) {
            return unregistered(OpName::DeleteInOne);
        }
        ops::delete_in_one(Arc::clone(&self.store), &self.collection, filter)
    }

    fn update_with(
        &self,
        name: OpName,
        op: UpdateOp,
        params: Document,
        filter: Document,
        body: Document,
    ) -> Task<OpError, UpdateResult> {
        if !self.contains(name) {
            return unregistered(name);
        }
        op.task(
            Arc::clone(&self.store),
            &self.collection,
            params,
            filter,
            body,
        )
    }
}

impl std::fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSet")
            .field("collection", &self.collection)
            .field("ops", &self.ops())
            .finish()
    }
}

/// Task that rejects on every fork with the missing-operation error.
fn unregistered<A: Send + 'static>(op: OpName) -> Task<OpError, A> {
    Task::rejected(OpError::NotRegistered(op))
}
