//! Session lifecycle tests against the in-memory backend.

mod common;

use bson::doc;
use doclink::{memory::InMemoryClient, prelude::*};

use common::{Member, healthy_session, session};

#[tokio::test]
async fn test_open_and_health_check_make_session_healthy() {
    let (_, session) = session();
    let ctx = Context::new();

    assert_eq!(session.state().await, SessionState::Unconnected);

    session.open(&ctx).await.unwrap();
    assert_eq!(session.state().await, SessionState::Connected);

    session.health_check(&ctx).await.unwrap();
    assert_eq!(session.state().await, SessionState::Healthy);
    assert!(session.is_healthy().await);
}

#[tokio::test]
async fn test_failed_health_check_clears_binding() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();

    store.faults().fail_ping(true);
    let err = session.health_check(&ctx).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::Connection { op: "health_check", .. }));
    assert_eq!(session.state().await, SessionState::Connected);

    let err = session
        .collection("members")
        .find_one::<Member>(&ctx, doc! {})
        .await
        .unwrap_err();
    assert!(err.is_not_ready());

    store.faults().fail_ping(false);
    session.health_check(&ctx).await.unwrap();
    assert!(session.is_healthy().await);
}

#[tokio::test]
async fn test_operations_without_health_check_do_no_io() {
    let (store, session) = session();
    let ctx = Context::new();
    session.open(&ctx).await.unwrap();

    let round_trips = store.stats().round_trips();
    let members = session.collection("members");

    assert!(members.delete_one(&ctx, doc! {}).await.unwrap_err().is_not_ready());
    assert!(members.delete_many(&ctx, doc! {}).await.unwrap_err().is_not_ready());
    assert!(members.insert_one(&ctx, &Member::new("u1", 1)).await.unwrap_err().is_not_ready());
    assert!(members.upsert_one(&ctx, doc! {}, doc! { "$set": { "level": 2 } }).await.unwrap_err().is_not_ready());
    assert!(members.find_one::<Member>(&ctx, doc! {}).await.unwrap_err().is_not_ready());
    assert!(members.find_many(&ctx, doc! {}).await.unwrap_err().is_not_ready());

    let mut destination: Vec<Member> = Vec::new();
    assert!(members.find_many_into(&ctx, doc! {}, &mut destination).await.unwrap_err().is_not_ready());

    assert_eq!(store.stats().round_trips(), round_trips);
}

#[tokio::test]
async fn test_health_check_before_open_is_not_ready() {
    let (store, session) = session();

    let err = session.health_check(&Context::new()).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::NotReady { op: "health_check" }));
    assert_eq!(store.stats().round_trips(), 0);
}

#[tokio::test]
async fn test_open_failure_is_connection_error() {
    let (store, session) = session();
    store.faults().fail_connect(true);

    let err = session.open(&Context::new()).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::Connection { op: "open", .. }));
    assert_eq!(session.state().await, SessionState::Unconnected);
}

#[tokio::test]
async fn test_close_is_terminal() {
    let (_, session) = healthy_session().await;
    let ctx = Context::new();

    session.close(&ctx).await.unwrap();
    assert_eq!(session.state().await, SessionState::Closed);

    assert!(session.open(&ctx).await.unwrap_err().is_not_ready());
    assert!(session.health_check(&ctx).await.unwrap_err().is_not_ready());
    assert!(
        session
            .collection("members")
            .delete_many(&ctx, doc! {})
            .await
            .unwrap_err()
            .is_not_ready()
    );
}

#[tokio::test]
async fn test_close_failure_still_closes() {
    let (store, session) = healthy_session().await;
    store.faults().fail_disconnect(true);

    let err = session.close(&Context::new()).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::Connection { op: "close", .. }));
    assert_eq!(session.state().await, SessionState::Closed);
}

#[tokio::test]
async fn test_connect_from_uri() {
    let session = Session::<InMemoryClient>::connect(SessionConfig::new("memory://tests", "app"))
        .await
        .unwrap();
    assert_eq!(session.database_name(), "app");

    let err = Session::<InMemoryClient>::connect(SessionConfig::new("localhost:27017", "app"))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Configuration { .. }));
}

#[tokio::test]
async fn test_session_is_shareable_between_tasks() {
    let (_, session) = healthy_session().await;
    let session = std::sync::Arc::new(session);

    let handles = (0..4)
        .map(|n| {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .collection("members")
                    .insert_one(&Context::new(), &Member::new(&format!("u{n}"), n))
                    .await
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut members: Vec<Member> = Vec::new();
    session
        .collection("members")
        .find_many_into(&Context::new(), doc! {}, &mut members)
        .await
        .unwrap();
    assert_eq!(members.len(), 4);
}
