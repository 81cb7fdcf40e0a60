//! In-memory storage implementation of the store protocol.
//!
//! Documents are kept as BSON documents in insertion order, grouped by database and
//! collection, behind an async-aware read-write lock.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, oid::ObjectId};

use doclink_core::{
    backend::{StoreClient, StoreCursor, StoreDatabase},
    error::{BackendError, BackendResult},
};

use crate::{
    evaluator::DocumentEvaluator,
    faults::{Faults, Stats},
    update::{ID_FIELD, apply_update, seed_from_filter},
};

type CollectionMap = Vec<Document>;
type DatabaseMap = HashMap<String, CollectionMap>;
type StoreMap = HashMap<String, DatabaseMap>;

/// The URI scheme accepted by [`InMemoryClient::from_uri`].
pub const MEMORY_SCHEME: &str = "memory://";


/// Thread-safe in-memory document store shared by every client created from it.
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state: clones share the
/// same documents, [`Faults`] and [`Stats`].
///
/// # Example
///
/// ```ignore
/// use doclink_memory::{InMemoryClient, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let client = InMemoryClient::new(store.clone());
///
/// store.faults().fail_ping(true);
/// assert!(client.ping().await.is_err());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> collection name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
    faults: Arc<Faults>,
    stats: Arc<Stats>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns a copy of a collection's documents, in store order.
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    async fn round_trip(&self) {
        self.stats.record_round_trip();

        let latency = self.faults.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}


/// A client for an [`InMemoryStore`].
#[derive(Debug, Clone)]
pub struct InMemoryClient {
    store: InMemoryStore,
    connected: Arc<AtomicBool>,
}

impl InMemoryClient {
    /// Creates an unconnected client for `store`.
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    fn ensure_connected(connected: &AtomicBool) -> BackendResult<()> {
        if connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Message("client is not connected".into()))
        }
    }
}

#[async_trait]
impl StoreClient for InMemoryClient {
    type Database = InMemoryDatabase;

    /// Accepts `memory://` URIs, optionally followed by a label. Each call creates a new,
    /// empty store.
    async fn from_uri(uri: &str) -> BackendResult<Self> {
        match uri.strip_prefix(MEMORY_SCHEME) {
            Some(label) if !label.contains(char::is_whitespace) => Ok(Self::new(InMemoryStore::new())),
            _ => Err(BackendError::Configuration(format!(
                "expected a {MEMORY_SCHEME} connection string, got {uri:?}"
            ))),
        }
    }

    async fn connect(&self) -> BackendResult<()> {
        self.store.round_trip().await;

        if self.store.faults.connect_fails() {
            return Err(BackendError::Message("handshake rejected".into()));
        }

        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> BackendResult<()> {
        self.store.round_trip().await;

        if self.store.faults.disconnect_fails() {
            return Err(BackendError::Message("teardown failed".into()));
        }

        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        self.store.round_trip().await;
        Self::ensure_connected(&self.connected)?;

        if self.store.faults.ping_fails() {
            return Err(BackendError::Message("primary unreachable".into()));
        }

        Ok(())
    }

    fn database(&self, name: &str) -> Self::Database {
        InMemoryDatabase {
            name: name.to_string(),
            store: self.store.clone(),
            connected: self.connected.clone(),
        }
    }
}


/// A handle to one database of an [`InMemoryStore`].
#[derive(Debug, Clone)]
pub struct InMemoryDatabase {
    name: String,
    store: InMemoryStore,
    connected: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn begin(&self) -> BackendResult<()> {
        self.store.round_trip().await;
        InMemoryClient::ensure_connected(&self.connected)
    }

    /// Positions of the documents matching `filter`, in store order.
    fn matching(documents: &[Document], filter: &Document) -> BackendResult<Vec<usize>> {
        let mut positions = Vec::new();

        for (position, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).matches(filter)? {
                positions.push(position);
            }
        }

        Ok(positions)
    }
}

#[async_trait]
impl StoreDatabase for InMemoryDatabase {
    type Cursor = InMemoryCursor;

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        self.begin().await?;

        let mut store = self.store.store.write().await;
        let Some(documents) = store
            .get_mut(&self.name)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(0);
        };

        match Self::matching(documents, &filter)?.first() {
            Some(&position) => {
                documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        self.begin().await?;

        let mut store = self.store.store.write().await;
        let Some(documents) = store
            .get_mut(&self.name)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(0);
        };

        let positions = Self::matching(documents, &filter)?;
        for position in positions.iter().rev() {
            documents.remove(*position);
        }

        Ok(positions.len() as u64)
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> BackendResult<()> {
        self.begin().await?;

        if !document.contains_key(ID_FIELD) {
            document.insert(ID_FIELD, ObjectId::new());
        }

        let mut store = self.store.store.write().await;
        let documents = store
            .entry(self.name.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if documents
            .iter()
            .any(|existing| existing.get(ID_FIELD) == document.get(ID_FIELD))
        {
            return Err(BackendError::Message(format!(
                "duplicate key {ID_FIELD} in collection {collection}"
            )));
        }

        documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> BackendResult<()> {
        self.begin().await?;

        let mut store = self.store.store.write().await;
        let documents = store
            .entry(self.name.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        match Self::matching(documents, &filter)?.first() {
            Some(&position) => {
                let mut updated = documents[position].clone();
                apply_update(&mut updated, &update, false)?;
                documents[position] = updated;
            }
            None if upsert => documents.push(seed_from_filter(&filter, &update)?),
            None => {}
        }

        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> BackendResult<Option<Document>> {
        self.begin().await?;

        let store = self.store.store.read().await;
        let Some(documents) = store
            .get(&self.name)
            .and_then(|collections| collections.get(collection))
        else {
            return Ok(None);
        };

        Ok(Self::matching(documents, &filter)?
            .first()
            .map(|&position| documents[position].clone()))
    }

    async fn find(&self, collection: &str, filter: Document) -> BackendResult<Self::Cursor> {
        self.begin().await?;

        if self.store.faults.find_fails() {
            return Err(BackendError::Message("query rejected".into()));
        }

        let matched = {
            let store = self.store.store.read().await;
            match store
                .get(&self.name)
                .and_then(|collections| collections.get(collection))
            {
                Some(documents) => Self::matching(documents, &filter)?
                    .into_iter()
                    .map(|position| documents[position].clone())
                    .collect::<VecDeque<_>>(),
                None => VecDeque::new(),
            }
        };

        if matched.is_empty() && self.store.faults.reports_no_documents() {
            return Err(BackendError::NoDocuments);
        }

        self.store.stats.record_cursor_opened();
        tracing::trace!(database = %self.name, collection, matched = matched.len(), "cursor opened");

        Ok(InMemoryCursor {
            remaining: matched,
            store: self.store.clone(),
        })
    }
}


/// A cursor over a snapshot of matching documents.
#[derive(Debug)]
pub struct InMemoryCursor {
    remaining: VecDeque<Document>,
    store: InMemoryStore,
}

#[async_trait]
impl StoreCursor for InMemoryCursor {
    async fn next_document(&mut self) -> BackendResult<Option<Document>> {
        if self.remaining.is_empty() {
            return Ok(None);
        }

        self.store.round_trip().await;
        Ok(self.remaining.pop_front())
    }

    async fn close(self) -> BackendResult<()> {
        if self.store.faults.cursor_close_fails() {
            return Err(BackendError::Message("cursor release failed".into()));
        }

        self.store.stats.record_cursor_released();
        Ok(())
    }
}
