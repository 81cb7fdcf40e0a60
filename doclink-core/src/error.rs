//! Error types and result types for document store operations.
//!
//! Backends report failures as [`BackendError`]. The access layer wraps them into
//! [`DocumentStoreError`], tagging each with the name of the operation that failed while
//! keeping the backend error reachable through [`std::error::Error::source`].

use bson::error::Error as BsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// A failure reported by a store backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The store reported that a read matched no documents.
    #[error("no documents in result")]
    NoDocuments,
    /// The connection string or client options were rejected.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The driver rejected the connection string or client options.
    #[error("invalid configuration: {source}")]
    InvalidOptions {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// An error raised by the underlying driver.
    #[error(transparent)]
    Driver(Box<dyn StdError + Send + Sync>),
    /// A backend failure described only by a message.
    #[error("{0}")]
    Message(String),
}

impl BackendError {
    /// Wraps a driver error, keeping it as the source.
    pub fn driver<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        BackendError::Driver(Box::new(err))
    }

    /// Wraps a driver error raised while building the client, keeping it as the source.
    pub fn invalid_options<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        BackendError::InvalidOptions { source: Box::new(err) }
    }

    /// Returns `true` if this is the store's "no documents" condition.
    pub fn is_no_documents(&self) -> bool {
        matches!(self, BackendError::NoDocuments)
    }
}

/// A specialized `Result` type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Why a [`Context`](crate::context::Context) stopped an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The cancellation token was triggered.
    Cancelled,
    /// The context deadline elapsed.
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Represents all possible errors returned by a session or a collection accessor.
///
/// Every variant names the operation that failed. Variants wrapping a backend or codec
/// failure expose it as their source, so the full cause chain is preserved.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The connection string was malformed or the client could not be constructed.
    #[error("configure store client: {source}")]
    Configuration {
        #[source]
        source: BackendError,
    },
    /// A handshake, ping, or teardown failed.
    #[error("{op}: connection error: {source}")]
    Connection {
        op: &'static str,
        #[source]
        source: BackendError,
    },
    /// The operation needs a healthy session with a bound database.
    #[error("{op}: session is not ready")]
    NotReady { op: &'static str },
    /// A read failed for a reason other than "no match".
    #[error("{op}: query failed on collection {collection}: {source}")]
    Query {
        op: &'static str,
        collection: String,
        #[source]
        source: BackendError,
    },
    /// A write (delete, insert, upsert) failed at the store.
    #[error("{op}: write failed on collection {collection}: {source}")]
    Write {
        op: &'static str,
        collection: String,
        #[source]
        source: BackendError,
    },
    /// A single-document read had no match.
    #[error("{op}: no document found in collection {collection}")]
    NotFound { op: &'static str, collection: String },
    /// A found document could not be decoded into the requested type.
    #[error("{op}: decode document from collection {collection}: {source}")]
    Decode {
        op: &'static str,
        collection: String,
        #[source]
        source: BsonError,
    },
    /// A document could not be encoded for the store.
    #[error("{op}: encode document for collection {collection}: {source}")]
    Encode {
        op: &'static str,
        collection: String,
        #[source]
        source: BsonError,
    },
    /// Releasing a query resource failed.
    #[error("{op}: release cursor on collection {collection}: {source}")]
    Resource {
        op: &'static str,
        collection: String,
        #[source]
        source: BackendError,
    },
    /// The caller's context was cancelled or its deadline passed.
    #[error("{op}: {reason}")]
    Cancelled {
        op: &'static str,
        reason: CancelReason,
    },
}

impl DocumentStoreError {
    /// Returns the name of the operation that produced this error.
    pub fn operation(&self) -> &'static str {
        match self {
            DocumentStoreError::Configuration { .. } => "connect",
            DocumentStoreError::Connection { op, .. }
            | DocumentStoreError::NotReady { op }
            | DocumentStoreError::Query { op, .. }
            | DocumentStoreError::Write { op, .. }
            | DocumentStoreError::NotFound { op, .. }
            | DocumentStoreError::Decode { op, .. }
            | DocumentStoreError::Encode { op, .. }
            | DocumentStoreError::Resource { op, .. }
            | DocumentStoreError::Cancelled { op, .. } => op,
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, DocumentStoreError::NotReady { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DocumentStoreError::Cancelled { .. })
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;
