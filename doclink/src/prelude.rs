//! Convenient re-exports of commonly used types from doclink.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use doclink::prelude::*;
//! ```
//!
//! This provides access to:
//! - Sessions, collections and cursors
//! - Document traits, destination containers and their derive macros
//! - The store protocol traits
//! - Contexts, configuration and error types

pub use doclink_core::{
    backend::{StoreClient, StoreCursor, StoreDatabase},
    collection::{Collection, CursorOf},
    config::SessionConfig,
    context::Context,
    cursor::Cursor,
    document::{Document, DocumentExt, DocumentSink, Element},
    error::{BackendError, BackendResult, CancelReason, DocumentStoreError, DocumentStoreResult},
    extension::{Module, Plugin, PluginError},
    session::{Session, SessionState},
};
pub use doclink_macros::{Document, Module};
pub use serde::{Deserialize, Serialize};
