//! A thin, typed access layer over document databases.
//!
//! This crate is the core of the doclink project and provides:
//!
//! - **Session** ([`session`]) - Connection lifecycle and database binding
//! - **Collections** ([`collection`]) - Collection-scoped CRUD and typed materialization
//! - **Cursors** ([`cursor`]) - Lazy sequences of raw documents
//! - **Document traits** ([`document`]) - Document shapes and destination containers
//! - **Store protocol** ([`backend`]) - Traits implemented by store drivers
//! - **Context** ([`context`]) - Cancellation and deadlines for every round trip
//! - **Configuration** ([`config`]) - Session configuration
//! - **Error handling** ([`error`]) - Error and result types
//! - **Extensions** ([`extension`]) - Module and plugin descriptors
//!
//! # Example
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryClient};
//! use bson::doc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! pub struct Guild {
//!     pub guild_id: String,
//!     pub prefix: String,
//! }
//!
//! let session = Session::<InMemoryClient>::connect(SessionConfig::new("memory://", "app")).await?;
//! let ctx = session.context();
//! session.open(&ctx).await?;
//! session.health_check(&ctx).await?;
//!
//! let mut guilds: Vec<Guild> = Vec::new();
//! session
//!     .collection("guilds")
//!     .find_many_into(&ctx, doc! {}, &mut guilds)
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_core;

pub mod backend;
pub mod collection;
pub mod config;
pub mod context;
pub mod cursor;
pub mod document;
pub mod error;
pub mod extension;
pub mod session;
