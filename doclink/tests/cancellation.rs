//! Cancellation and deadline tests.
//!
//! The in-memory store's latency fault stands in for a slow network; time is paused so the
//! deadlines below are exact.

mod common;

use std::time::Duration;

use bson::doc;
use doclink::{memory::InMemoryClient, prelude::*};

use common::{Member, healthy_session, seed_members};

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_flight_yields_cancelled() {
    let (store, session) = healthy_session().await;
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = session
        .collection("members")
        .find_one::<Member>(&ctx, doc! {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "find_one", reason: CancelReason::Cancelled }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_context_does_no_io() {
    let (store, session) = healthy_session().await;
    let round_trips = store.stats().round_trips();

    let ctx = Context::new();
    ctx.cancel();

    let err = session
        .collection("members")
        .delete_many(&ctx, doc! {})
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(store.stats().round_trips(), round_trips);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_during_round_trip_yields_cancelled() {
    let (store, session) = healthy_session().await;
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let err = session
        .collection("members")
        .insert_one(&ctx, &Member::new("u1", 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "insert_one", reason: CancelReason::DeadlineExceeded }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_materialization_releases_cursor() {
    let (store, session) = healthy_session().await;
    seed_members(
        &session,
        &[Member::new("u1", 1), Member::new("u2", 2), Member::new("u3", 3)],
    )
    .await;
    store.faults().set_latency(Duration::from_millis(50));

    // find and the first fetch fit inside the deadline, the second fetch does not.
    let ctx = Context::new().with_timeout(Duration::from_millis(120));
    let mut members: Vec<Member> = Vec::new();
    let err = session
        .collection("members")
        .find_many_into(&ctx, doc! {}, &mut members)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(members, vec![Member::new("u1", 1)]);
    assert_eq!(store.stats().cursors_opened(), 1);
    assert_eq!(store.stats().open_cursors(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_health_check_unbinds_database() {
    let (store, session) = healthy_session().await;
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let err = session.health_check(&ctx).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.state().await, SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_session_context_applies_operation_timeout() {
    let store = doclink::memory::InMemoryStore::new();
    let session = Session::with_client(
        InMemoryClient::new(store.clone()),
        SessionConfig::new("memory://", "app").operation_timeout(Duration::from_millis(100)),
    );
    store.faults().set_latency(Duration::from_secs(1));

    let err = session.open(&session.context()).await.unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "open", reason: CancelReason::DeadlineExceeded }
    ));
    assert_eq!(session.state().await, SessionState::Unconnected);
}

#[tokio::test(start_paused = true)]
async fn test_child_context_follows_parent_cancellation() {
    let (store, session) = healthy_session().await;
    store.faults().set_latency(Duration::from_secs(1));

    let parent = Context::new();
    let child = parent.child();
    let canceller = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = session
        .collection("members")
        .upsert_one(&child, doc! { "user_id": "u1" }, doc! { "$set": { "level": 2 } })
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_find_many_yields_cancelled() {
    let (store, session) = healthy_session().await;
    seed_members(&session, &[Member::new("u1", 1)]).await;
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = session
        .collection("members")
        .find_many(&ctx, doc! {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "find_many", reason: CancelReason::Cancelled }
    ));
    assert_eq!(store.stats().cursors_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cursor_fetch_past_deadline_yields_cancelled() {
    let (store, session) = healthy_session().await;
    seed_members(&session, &[Member::new("u1", 1)]).await;

    let mut cursor = session
        .collection("members")
        .find_many(&Context::new(), doc! {})
        .await
        .unwrap();
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let err = cursor.next(&ctx).await.unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "cursor_next", reason: CancelReason::DeadlineExceeded }
    ));

    cursor.close().await.unwrap();
    assert_eq!(store.stats().open_cursors(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_close_still_closes_session() {
    let (store, session) = healthy_session().await;
    store.faults().set_latency(Duration::from_secs(1));

    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let err = session.close(&ctx).await.unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::Cancelled { op: "close", reason: CancelReason::DeadlineExceeded }
    ));
    assert_eq!(session.state().await, SessionState::Closed);
}
