//! In-memory document store backend for doclink.
//!
//! This crate provides a thread-safe, in-memory implementation of the store protocol
//! (`StoreClient`, `StoreDatabase`, `StoreCursor`). It uses async-aware read-write locks for
//! concurrent access and is intended for development and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Native filters** - Equality, comparison and logical operators over BSON documents
//! - **Updates and upserts** - `$set`, `$unset`, `$inc`, `$setOnInsert` and replacements
//! - **Fault injection** - Failing connects, pings, queries and cursor releases on demand
//! - **Statistics** - Round-trip and cursor counters for asserting resource release
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryClient};
//! use bson::doc;
//!
//! let session = Session::<InMemoryClient>::connect(SessionConfig::new("memory://", "app")).await?;
//! let ctx = session.context();
//!
//! session.open(&ctx).await?;
//! session.health_check(&ctx).await?;
//!
//! session
//!     .collection("guilds")
//!     .insert_one(&ctx, &doc! { "guild_id": "42" })
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_memory;

mod evaluator;
mod update;

pub mod faults;
pub mod store;

pub use faults::{Faults, Stats};
pub use store::{InMemoryClient, InMemoryCursor, InMemoryDatabase, InMemoryStore, MEMORY_SCHEME};
