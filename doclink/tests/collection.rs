//! Collection CRUD tests against the in-memory backend.

mod common;

use bson::doc;
use doclink::prelude::*;

use common::{DATABASE, Member, healthy_session, seed_members};

#[tokio::test]
async fn test_upsert_creates_then_updates_same_document() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    let guilds = session.collection("guilds");

    guilds
        .upsert_one(&ctx, doc! { "guild_id": "42" }, doc! { "$set": { "prefix": "!" } })
        .await
        .unwrap();
    guilds
        .upsert_one(&ctx, doc! { "guild_id": "42" }, doc! { "$set": { "prefix": "?" } })
        .await
        .unwrap();

    let documents = store.documents(DATABASE, "guilds").await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].get_str("guild_id").unwrap(), "42");
    assert_eq!(documents[0].get_str("prefix").unwrap(), "?");
}

#[tokio::test]
async fn test_deletes_matching_nothing_succeed() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    seed_members(&session, &[Member::new("u1", 1)]).await;

    let members = session.collection("members");
    members.delete_one(&ctx, doc! { "user_id": "nobody" }).await.unwrap();
    members.delete_many(&ctx, doc! { "level": { "$gt": 99 } }).await.unwrap();
    session.collection("empty").delete_many(&ctx, doc! {}).await.unwrap();

    assert_eq!(store.documents(DATABASE, "members").await.len(), 1);
}

#[tokio::test]
async fn test_delete_one_and_delete_many() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    seed_members(
        &session,
        &[Member::new("u1", 1), Member::new("u2", 1), Member::new("u3", 2), Member::new("u4", 1)],
    )
    .await;

    let members = session.collection("members");
    members.delete_one(&ctx, doc! { "level": 1 }).await.unwrap();
    assert_eq!(store.documents(DATABASE, "members").await.len(), 3);

    members.delete_many(&ctx, doc! { "level": 1 }).await.unwrap();
    let remaining = store.documents(DATABASE, "members").await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get_str("user_id").unwrap(), "u3");
}

#[tokio::test]
async fn test_find_one_decodes_first_match() {
    let (_, session) = healthy_session().await;
    seed_members(&session, &[Member::new("u1", 5), Member::new("u2", 5)]).await;

    let member: Member = session
        .collection("members")
        .find_one(&Context::new(), doc! { "level": 5 })
        .await
        .unwrap();

    assert_eq!(member, Member::new("u1", 5));
}

#[tokio::test]
async fn test_find_one_without_match_is_not_found() {
    let (_, session) = healthy_session().await;

    let err = session
        .collection("members")
        .find_one::<Member>(&Context::new(), doc! { "user_id": "u1" })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.operation(), "find_one");
}

#[tokio::test]
async fn test_find_one_with_wrong_shape_is_decode_error() {
    let (_, session) = healthy_session().await;
    let ctx = Context::new();
    session
        .collection("members")
        .insert_one(&ctx, &doc! { "user_id": "u1", "level": "high" })
        .await
        .unwrap();

    let err = session
        .collection("members")
        .find_one::<Member>(&ctx, doc! { "user_id": "u1" })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Decode { op: "find_one", .. }));
}

#[tokio::test]
async fn test_insert_of_non_document_is_encode_error() {
    let (store, session) = healthy_session().await;

    let err = session
        .collection("members")
        .insert_one(&Context::new(), &42_i32)
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Encode { op: "insert_one", .. }));
    assert!(store.documents(DATABASE, "members").await.is_empty());
}

#[tokio::test]
async fn test_rejected_write_is_write_error() {
    let (_, session) = healthy_session().await;
    let ctx = Context::new();
    let members = session.collection("members");

    members.insert_one(&ctx, &doc! { "_id": 1 }).await.unwrap();
    let err = members.insert_one(&ctx, &doc! { "_id": 1 }).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::Write { op: "insert_one", .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_find_many_iterates_raw_documents_in_order() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    seed_members(&session, &[Member::new("u1", 1), Member::new("u2", 2)]).await;

    let mut cursor = session
        .collection("members")
        .find_many(&ctx, doc! {})
        .await
        .unwrap();

    let first = cursor.next(&ctx).await.unwrap().unwrap();
    assert_eq!(first.get_str("user_id").unwrap(), "u1");

    let second: Member = cursor.next_as(&ctx).await.unwrap().unwrap();
    assert_eq!(second, Member::new("u2", 2));

    assert!(cursor.next(&ctx).await.unwrap().is_none());

    cursor.close().await.unwrap();
    assert_eq!(store.stats().open_cursors(), 0);
}

#[tokio::test]
async fn test_find_many_folds_no_documents_into_empty_cursor() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    store.faults().report_no_documents(true);

    let mut cursor = session
        .collection("members")
        .find_many(&ctx, doc! { "user_id": "nobody" })
        .await
        .unwrap();

    assert!(cursor.next(&ctx).await.unwrap().is_none());
    cursor.close().await.unwrap();
}

#[tokio::test]
async fn test_find_many_failure_is_query_error() {
    let (store, session) = healthy_session().await;
    store.faults().fail_find(true);

    let err = session
        .collection("members")
        .find_many(&Context::new(), doc! {})
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Query { op: "find_many", .. }));
}

#[tokio::test]
async fn test_upsert_inc_past_i32_range_widens() {
    let (store, session) = healthy_session().await;
    let ctx = Context::new();
    let counters = session.collection("counters");

    counters
        .upsert_one(&ctx, doc! { "k": 1 }, doc! { "$set": { "n": i32::MAX } })
        .await
        .unwrap();
    counters
        .upsert_one(&ctx, doc! { "k": 1 }, doc! { "$inc": { "n": 1 } })
        .await
        .unwrap();

    let documents = store.documents(DATABASE, "counters").await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].get_i64("n").unwrap(), i32::MAX as i64 + 1);
}

#[tokio::test]
async fn test_upsert_inc_past_i64_range_is_write_error() {
    let (_, session) = healthy_session().await;
    let ctx = Context::new();
    let counters = session.collection("counters");

    counters
        .upsert_one(&ctx, doc! { "k": 1 }, doc! { "$set": { "n": i64::MAX } })
        .await
        .unwrap();
    let err = counters
        .upsert_one(&ctx, doc! { "k": 1 }, doc! { "$inc": { "n": 1 } })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Write { op: "upsert_one", .. }));

    // The store stays usable after the rejected update.
    counters.delete_many(&ctx, doc! { "k": 1 }).await.unwrap();
}
