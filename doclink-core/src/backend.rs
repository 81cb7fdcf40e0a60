//! Store protocol abstraction for the access layer.
//!
//! This module defines the traits a document database driver implements so that a
//! [`Session`](crate::session::Session) and its collection accessors can work with it.
//!
//! # Overview
//!
//! - [`StoreClient`]: constructs a client from a connection string and manages the
//!   connection lifecycle (`connect`, `disconnect`, `ping`)
//! - [`StoreDatabase`]: a handle to one named database, exposing the document capabilities
//!   {delete, find, insert, update}
//! - [`StoreCursor`]: a lazy, store-managed sequence of raw documents that must be
//!   explicitly released
//!
//! Filters, updates, and documents cross this boundary as raw [`bson::Document`] values.
//! They are forwarded as-is: the access layer never inspects or rewrites them.
//!
//! # Examples
//!
//! ```ignore
//! use doclink::backend::{StoreClient, StoreDatabase};
//! use bson::doc;
//!
//! let client = MyClient::from_uri("my-store://localhost").await?;
//! client.connect().await?;
//! client.ping().await?;
//!
//! let database = client.database("app");
//! database.insert_one("users", doc! { "name": "Alice" }).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::error::BackendResult;

/// A client for a document store.
///
/// Implementations are expected to be internally pooled and safe to use from many
/// tasks at once: the access layer never serializes calls on a client.
///
/// # Errors
///
/// Methods return [`BackendResult`](crate::error::BackendResult). The session wraps those
/// errors with the name of the operation that produced them.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug + Sized + 'static {
    /// The database handle type produced by [`StoreClient::database`].
    type Database: StoreDatabase;

    /// Constructs a client configured with the given connection string.
    ///
    /// No round trip to the store is made here. Implementations should fail with
    /// [`BackendError::Configuration`](crate::error::BackendError::Configuration) when the
    /// connection string cannot be parsed.
    async fn from_uri(uri: &str) -> BackendResult<Self>;

    /// Performs the network handshake with the store.
    async fn connect(&self) -> BackendResult<()>;

    /// Tears down the connection to the store.
    async fn disconnect(&self) -> BackendResult<()>;

    /// Issues a lightweight round trip checking that the primary is reachable.
    async fn ping(&self) -> BackendResult<()>;

    /// Returns a handle to the named database.
    ///
    /// This is a local operation; the database is neither validated nor created.
    fn database(&self, name: &str) -> Self::Database;
}

/// A handle to one database of a document store.
///
/// Collection names are passed through unvalidated: resolving them is the store's job.
#[async_trait]
pub trait StoreDatabase: Send + Sync + Debug + 'static {
    /// The cursor type returned by [`StoreDatabase::find`].
    type Cursor: StoreCursor;

    /// Deletes the first document matching `filter`.
    ///
    /// # Returns
    ///
    /// The number of documents deleted (zero or one).
    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<u64>;

    /// Deletes every document matching `filter`.
    ///
    /// # Returns
    ///
    /// The number of documents deleted.
    async fn delete_many(&self, collection: &str, filter: Document) -> BackendResult<u64>;

    /// Inserts one document as-is.
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<()>;

    /// Updates the first document matching `filter` with `update`.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection
    /// * `filter` - The store-native predicate selecting the document
    /// * `update` - The store-native update specification
    /// * `upsert` - Whether to insert a new document when nothing matches
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> BackendResult<()>;

    /// Finds the first document matching `filter`, or `None` when nothing matches.
    async fn find_one(&self, collection: &str, filter: Document) -> BackendResult<Option<Document>>;

    /// Opens a cursor over every document matching `filter`, in store order.
    ///
    /// Some stores report an empty match as
    /// [`BackendError::NoDocuments`](crate::error::BackendError::NoDocuments) instead of an
    /// empty cursor; callers decide how to treat that condition.
    async fn find(&self, collection: &str, filter: Document) -> BackendResult<Self::Cursor>;
}

/// A lazy, store-managed sequence of raw documents.
///
/// A cursor holds server-side resources until [`StoreCursor::close`] is called.
#[async_trait]
pub trait StoreCursor: Send + 'static {
    /// Fetches the next raw document, or `None` once the sequence is exhausted.
    async fn next_document(&mut self) -> BackendResult<Option<Document>>;

    /// Releases the resources held by this cursor.
    async fn close(self) -> BackendResult<()>
    where
        Self: Sized;
}
