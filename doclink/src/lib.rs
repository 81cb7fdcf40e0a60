//! Main doclink crate providing a typed access layer over document databases.
//!
//! This crate is the primary entry point for users of doclink. It re-exports the core types
//! from the sub-crates, the derive macros, and the available store backends.
//!
//! # Features
//!
//! - **Session lifecycle** - Open, health-check and close a store connection explicitly
//! - **Typed reads** - Decode query results into your own serde types
//! - **Generic materialization** - Fill `Vec<T>`, `Vec<Box<T>>` or `VecDeque<Arc<T>>` from a query
//! - **Cancellation** - Every round trip honors a [`Context`](context::Context) deadline or cancel signal
//! - **Multiple backends** - In-memory for tests, MongoDB behind the `mongodb` feature
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryClient};
//! use bson::doc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! pub struct Member {
//!     pub user_id: String,
//!     pub level: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let session = Session::<InMemoryClient>::connect(SessionConfig::new("memory://", "app")).await?;
//!     let ctx = session.context();
//!
//!     session.open(&ctx).await?;
//!     session.health_check(&ctx).await?;
//!
//!     let members = session.collection("members");
//!     members
//!         .insert_one(&ctx, &Member { user_id: "u1".into(), level: 3 })
//!         .await?;
//!
//!     let member: Member = members.find_one(&ctx, doc! { "user_id": "u1" }).await?;
//!
//!     let mut all: Vec<Member> = Vec::new();
//!     members.find_many_into(&ctx, doc! { "level": { "$gte": 1 } }, &mut all).await?;
//!
//!     session.close(&ctx).await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as doclink;

pub mod prelude;

pub use doclink_core::{backend, collection, config, context, cursor, document, error, extension, session};
pub use doclink_macros::{Document, Module};

// Re-export BSON types for convenience
pub use bson;

#[doc(hidden)]
pub mod __private {
    pub use serde::{Serialize, de::DeserializeOwned};
}

/// In-memory storage backend implementations.
pub mod memory {
    pub use doclink_memory::{
        Faults, InMemoryClient, InMemoryCursor, InMemoryDatabase, InMemoryStore, MEMORY_SCHEME, Stats,
    };
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use doclink_mongodb::{MongoDbClient, MongoDbCursor, MongoDbDatabase};
}
