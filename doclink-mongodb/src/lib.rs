//! MongoDB backend implementation for doclink.
//!
//! This crate implements the doclink store protocol on top of the official MongoDB async
//! driver. Filters and updates are passed to the server unchanged.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! doclink = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The connection string is taken from [`SessionConfig`](doclink_core::config::SessionConfig)
//! and parsed by the driver when the session is created. `open` warms the connection pool
//! and `health_check` pings the primary.
//!
//! # Example
//!
//! ```ignore
//! use doclink::{prelude::*, mongodb::MongoDbClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("mongodb://localhost:27017", "my_database");
//!     let session = Session::<MongoDbClient>::connect(config).await?;
//!     let ctx = session.context();
//!
//!     session.open(&ctx).await?;
//!     session.health_check(&ctx).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_mongodb;

pub mod store;

pub use store::{MongoDbClient, MongoDbCursor, MongoDbDatabase};
