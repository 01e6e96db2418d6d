use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::query;
use crate::traits::{Connector, DocumentStore};
use crate::types::{
    CreateIndexesResult, DeleteResult, IndexSpec, InsertManyResult, InsertOneResult, UpdateResult,
};
use crate::update::apply_update;

#[derive(Default)]
struct Collection {
    docs: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

/// In-memory document store for tests and embedding.
///
/// Documents live in insertion order behind a `RwLock`; find and aggregate
/// return that order. Unique indexes registered through `create_indexes` are
/// enforced on every subsequent insert.
pub struct MemoryStore {
    name: String,
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    /// Create an empty store for the named database.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Database name this store was created (or connected) with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert fixture documents directly, bypassing index checks.
    pub fn seed(&self, collection: &str, docs: Vec<Document>) {
        let mut map = self.collections.write().expect("lock poisoned");
        let coll = map.entry(collection.to_string()).or_default();
        for mut doc in docs {
            ensure_id(&mut doc);
            coll.docs.push(doc);
        }
    }

    /// Names of all collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let map = self.collections.read().expect("lock poisoned");
        map.keys().cloned().collect()
    }

    /// Number of documents in a collection (0 when it does not exist).
    pub fn count(&self, collection: &str) -> usize {
        let map = self.collections.read().expect("lock poisoned");
        map.get(collection).map_or(0, |c| c.docs.len())
    }

    /// Drop a collection. Returns `true` if it existed.
    pub fn drop_collection(&self, collection: &str) -> bool {
        let mut map = self.collections.write().expect("lock poisoned");
        map.remove(collection).is_some()
    }

    /// Drop every collection.
    pub fn clear(&self) {
        self.collections.write().expect("lock poisoned").clear();
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.collections.read().expect("lock poisoned");
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("collections", &map.len())
            .finish()
    }
}

fn ensure_id(doc: &mut Document) -> Bson {
    if let Some(id) = doc.get("_id") {
        return id.clone();
    }
    let id = Bson::ObjectId(ObjectId::new());
    doc.insert("_id", id.clone());
    id
}

/// Reject a candidate document that collides with an existing one on any
/// unique index. Fields absent from the candidate are not checked.
fn check_unique(db: &str, name: &str, coll: &Collection, candidate: &Document) -> StoreResult<()> {
    for index in coll.indexes.iter().filter(|i| i.unique) {
        for (field, _) in &index.key {
            let Some(value) = query::get_path(candidate, field) else {
                continue;
            };
            let collides = coll
                .docs
                .iter()
                .any(|existing| {
                    query::get_path(existing, field).map_or(false, |v| query::bson_eq(v, value))
                });
            if collides {
                warn!(db, collection = name, index = %index.name, "duplicate key rejected");
                return Err(StoreError::DuplicateKey {
                    collection: name.to_string(),
                    index: index.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn insert_into(db: &str, name: &str, coll: &mut Collection, mut doc: Document) -> StoreResult<Bson> {
    check_unique(db, name, coll, &doc)?;
    let id = ensure_id(&mut doc);
    coll.docs.push(doc);
    Ok(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let map = self.collections.read().expect("lock poisoned");
        let docs = map.get(collection).map_or_else(Vec::new, |coll| {
            coll.docs
                .iter()
                .filter(|doc| query::matches(doc, filter))
                .cloned()
                .collect()
        });
        Ok(docs)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<InsertOneResult> {
        let mut map = self.collections.write().expect("lock poisoned");
        let coll = map.entry(collection.to_string()).or_default();
        let inserted_id = insert_into(&self.name, collection, coll, doc)?;
        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> StoreResult<InsertManyResult> {
        let mut map = self.collections.write().expect("lock poisoned");
        let coll = map.entry(collection.to_string()).or_default();
        // Ordered insert: documents before the first failure stay inserted.
        let mut inserted_ids = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted_ids.push(insert_into(&self.name, collection, coll, doc)?);
        }
        Ok(InsertManyResult {
            inserted_count: inserted_ids.len() as u64,
            inserted_ids,
        })
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Document,
        operator: &Document,
        params: &Document,
    ) -> StoreResult<UpdateResult> {
        let upsert = params.get_bool("upsert").unwrap_or(false);
        let multi = params.get_bool("multi").unwrap_or(false);

        let mut map = self.collections.write().expect("lock poisoned");
        let coll = map.entry(collection.to_string()).or_default();

        let mut matched = 0u64;
        let mut modified = 0u64;
        for doc in coll.docs.iter_mut() {
            if !query::matches(doc, filter) {
                continue;
            }
            matched += 1;
            if apply_update(doc, operator)? {
                modified += 1;
            }
            if !multi {
                break;
            }
        }

        if matched == 0 && upsert {
            // The upserted document starts from the filter's equality fields.
            let mut doc = filter.clone();
            apply_update(&mut doc, operator)?;
            let id = insert_into(&self.name, collection, coll, doc)?;
            debug!(db = %self.name, collection, "upserted");
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                upserted_id: Some(id),
            });
        }

        Ok(UpdateResult {
            matched_count: matched,
            modified_count: modified,
            upserted_id: None,
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> StoreResult<DeleteResult> {
        let mut map = self.collections.write().expect("lock poisoned");
        let Some(coll) = map.get_mut(collection) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };
        let position = coll.docs.iter().position(|doc| query::matches(doc, filter));
        match position {
            Some(i) => {
                coll.docs.remove(i);
                Ok(DeleteResult { deleted_count: 1 })
            }
            None => Ok(DeleteResult { deleted_count: 0 }),
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> StoreResult<Vec<Document>> {
        let map = self.collections.read().expect("lock poisoned");
        let mut current: Vec<Document> = map
            .get(collection)
            .map_or_else(Vec::new, |coll| coll.docs.clone());

        for stage in pipeline {
            let Some((name, spec)) = stage.iter().next() else {
                return Err(StoreError::InvalidPipeline("empty stage".into()));
            };
            if name.as_str() != "$lookup" {
                return Err(StoreError::InvalidPipeline(format!(
                    "unsupported stage {name}"
                )));
            }
            let spec = spec
                .as_document()
                .ok_or_else(|| StoreError::InvalidPipeline("$lookup spec must be a document".into()))?;
            current = lookup_stage(&map, &current, spec)?;
        }
        Ok(current)
    }

    async fn create_indexes(
        &self,
        collection: &str,
        specs: &[IndexSpec],
    ) -> StoreResult<CreateIndexesResult> {
        let mut map = self.collections.write().expect("lock poisoned");
        let created_collection_automatically = !map.contains_key(collection);
        let coll = map.entry(collection.to_string()).or_default();

        // +1 for the implicit _id index, per driver reporting convention.
        let num_indexes_before = coll.indexes.len() as u64 + 1;
        let mut index_names = Vec::new();
        for spec in specs {
            if coll.indexes.iter().any(|existing| existing.name == spec.name) {
                continue;
            }
            index_names.push(spec.name.clone());
            coll.indexes.push(spec.clone());
        }
        let num_indexes_after = coll.indexes.len() as u64 + 1;
        debug!(
            db = %self.name,
            collection,
            created = index_names.len(),
            "indexes created"
        );

        Ok(CreateIndexesResult {
            created_collection_automatically,
            num_indexes_before,
            num_indexes_after,
            index_names,
        })
    }
}

/// One `$lookup` stage: left outer join attaching an array-valued field.
fn lookup_stage(
    map: &BTreeMap<String, Collection>,
    source: &[Document],
    spec: &Document,
) -> StoreResult<Vec<Document>> {
    let malformed = |field: &str| StoreError::InvalidPipeline(format!("$lookup missing {field}"));
    let from = spec.get_str("from").map_err(|_| malformed("from"))?;
    let local_field = spec
        .get_str("localField")
        .map_err(|_| malformed("localField"))?;
    let foreign_field = spec
        .get_str("foreignField")
        .map_err(|_| malformed("foreignField"))?;
    let output = spec.get_str("as").map_err(|_| malformed("as"))?;

    let foreign: &[Document] = match map.get(from) {
        Some(coll) => &coll.docs,
        None => &[],
    };
    let mut joined = Vec::with_capacity(source.len());
    for doc in source {
        // Missing keys join as null, matching the driver's semantics.
        let local = query::get_path(doc, local_field)
            .cloned()
            .unwrap_or(Bson::Null);
        let matches: Vec<Bson> = foreign
            .iter()
            .filter(|fd| {
                let fv = query::get_path(fd, foreign_field)
                    .cloned()
                    .unwrap_or(Bson::Null);
                query::bson_eq(&local, &fv)
            })
            .map(|fd| Bson::Document(fd.clone()))
            .collect();
        let mut out = doc.clone();
        out.insert(output, Bson::Array(matches));
        joined.push(out);
    }
    Ok(joined)
}

/// Connection acquisition for [`MemoryStore`] databases.
///
/// Accepts `memdb://<host>/<database>` URLs and hands out one shared store
/// per database name, so two connects to the same URL see the same data.
pub struct MemoryConnector {
    databases: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(HashMap::new()),
        }
    }

    /// The store behind a database name, if a connect created it.
    pub fn database(&self, name: &str) -> Option<Arc<MemoryStore>> {
        let dbs = self.databases.lock().expect("lock poisoned");
        dbs.get(name).cloned()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> StoreResult<Arc<dyn DocumentStore>> {
        let name = parse_memdb_url(url)?;
        let mut dbs = self.databases.lock().expect("lock poisoned");
        let store = dbs
            .entry(name.clone())
            .or_insert_with(|| Arc::new(MemoryStore::new(&name)));
        debug!(db = %name, "connected");
        Ok(Arc::clone(store) as Arc<dyn DocumentStore>)
    }
}

fn parse_memdb_url(url: &str) -> StoreResult<String> {
    let invalid = |reason: &str| StoreError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };
    let rest = url
        .strip_prefix("memdb://")
        .ok_or_else(|| invalid("expected memdb:// scheme"))?;
    let (_, database) = rest
        .split_once('/')
        .ok_or_else(|| invalid("missing database name"))?;
    if database.is_empty() {
        return Err(invalid("missing database name"));
    }
    Ok(database.to_string())
}
