//! Shared fixtures for the doclink integration tests.

#![allow(dead_code)]

use doclink::{
    memory::{InMemoryClient, InMemoryStore},
    prelude::*,
};

pub const DATABASE: &str = "app";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
pub struct Member {
    pub user_id: String,
    pub level: i32,
}

impl Member {
    pub fn new(user_id: &str, level: i32) -> Self {
        Self {
            user_id: user_id.to_string(),
            level,
        }
    }
}

/// A session over a fresh in-memory store, not yet opened.
pub fn session() -> (InMemoryStore, Session<InMemoryClient>) {
    let store = InMemoryStore::new();
    let session = Session::with_client(
        InMemoryClient::new(store.clone()),
        SessionConfig::new("memory://", DATABASE),
    );

    (store, session)
}

/// A session that is opened and healthy.
pub async fn healthy_session() -> (InMemoryStore, Session<InMemoryClient>) {
    let (store, session) = session();
    let ctx = Context::new();

    session.open(&ctx).await.expect("open");
    session.health_check(&ctx).await.expect("health check");

    (store, session)
}

/// Inserts `members` into the `members` collection in order.
pub async fn seed_members(session: &Session<InMemoryClient>, members: &[Member]) {
    let ctx = Context::new();
    let collection = session.collection("members");

    for member in members {
        collection.insert_one(&ctx, member).await.expect("insert member");
    }
}
