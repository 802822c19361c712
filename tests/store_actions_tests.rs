//! Integration tests for dispatch orchestration against the mock server:
//! fetch/create/update/get/delete for collections and the singleton flows.

mod common;

use common::blog_store;
use reflectstore::StoreError;
use serde_json::json;

#[tokio::test]
async fn test_fetch_commits_collection() {
    let (store, _server) = blog_store();

    // pre-fetch the table is empty
    let collection = store.getter("posts").unwrap();
    assert_eq!(collection.as_array().unwrap().len(), 0);

    let fetched = store.dispatch("posts.fetch", json!(null)).await.unwrap();
    let fetched = fetched.as_array().unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0]["id"], json!(1));
    assert_eq!(fetched[0]["title"], json!("Foo"));
    // nested author reference is pulled down to its identifier
    assert_eq!(fetched[0]["author"], json!(1));

    let collection = store.getter("posts").unwrap();
    assert_eq!(collection.as_array().unwrap().len(), 2);

    let single = store.getter_with("posts", json!(1)).unwrap();
    assert_eq!(single["id"], json!(1));
}

#[tokio::test]
async fn test_create_commits_record() {
    let (store, _server) = blog_store();
    store.dispatch("posts.fetch", json!(null)).await.unwrap();

    let created = store
        .dispatch(
            "posts.create",
            json!({"title": "a", "body": "aaa", "author": {"id": 1}}),
        )
        .await
        .unwrap();
    assert_eq!(created["id"], json!(3));
    assert_eq!(created["title"], json!("a"));
    // push mutation ran before the payload hit the wire
    assert_eq!(created["body"], json!("<div>aaa</div>"));
    assert_eq!(created["author"], json!(1));

    let collection = store.getter("posts").unwrap();
    assert_eq!(collection.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_validation_failures() {
    let (store, _server) = blog_store();

    let err = store
        .dispatch("authors.create", json!({"name": "a", "email": "bad"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(err.to_string().contains("`bad` is not a valid email."));

    let err = store
        .dispatch("authors.create", json!({"email": "a@b.com"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Contract(_)));

    // nothing was committed by the failed attempts
    assert_eq!(store.getter("authors").unwrap(), json!([]));

    let created = store
        .dispatch("authors.create", json!({"name": "a", "email": "a@b.com"}))
        .await
        .unwrap();
    assert_eq!(created["id"], json!(3));
}

#[tokio::test]
async fn test_update_commits_record() {
    let (store, _server) = blog_store();
    store.dispatch("authors.fetch", json!(null)).await.unwrap();

    let author = store.getter_with("authors", json!(1)).unwrap();
    assert_eq!(author["name"], json!("Jane Doe"));

    let updated = store
        .dispatch("authors.update", json!({"id": 1, "name": "a"}))
        .await
        .unwrap();
    assert_eq!(updated["name"], json!("a"));

    let author = store.getter_with("authors", json!(1)).unwrap();
    assert_eq!(author["name"], json!("a"));
}

#[tokio::test]
async fn test_update_requires_id() {
    let (store, _server) = blog_store();
    let err = store
        .dispatch("authors.update", json!({"name": "a"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Contract(_)));
}

#[tokio::test]
async fn test_get_commits_single_record() {
    let (store, _server) = blog_store();

    let fetched = store.dispatch("authors.get", json!(1)).await.unwrap();
    assert_eq!(fetched["name"], json!("Jane Doe"));

    let author = store.getter_with("authors", json!(1)).unwrap();
    assert_eq!(author["name"], json!("Jane Doe"));
}

#[tokio::test]
async fn test_get_missing_record_rejects() {
    let (store, _server) = blog_store();
    let err = store.dispatch("authors.get", json!(99)).await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
}

#[tokio::test]
async fn test_delete_removes_record() {
    let (store, _server) = blog_store();
    store.dispatch("posts.fetch", json!(null)).await.unwrap();

    let post = store.getter_with("posts", json!(2)).unwrap();
    assert_eq!(post["title"], json!("Bar"));

    store.dispatch("posts.delete", json!(2)).await.unwrap();

    assert_eq!(store.getter_with("posts", json!(2)).unwrap(), json!(null));
    assert_eq!(store.getter("posts").unwrap().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_endpoint_is_config_error() {
    let (store, _server) = blog_store();

    // posts has no explicit delete endpoint but falls back to model
    let err = store.dispatch("profile.create", json!({})).await.unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
    assert!(err.to_string().contains("'create' option"));
}

#[tokio::test]
async fn test_custom_action_commits_response() {
    let (store, _server) = blog_store();

    let latest = store.dispatch("posts.latest", json!(null)).await.unwrap();
    assert_eq!(latest["id"], json!(2));
    assert_eq!(latest["title"], json!("Bar"));

    // the response record landed in the table like a standard get
    assert_eq!(
        store.getter_with("posts", json!(2)).unwrap()["title"],
        json!("Bar")
    );
}

#[tokio::test]
async fn test_fetch_params_forwarded_as_query_string() {
    let (store, _server) = blog_store();
    // params must not break the endpoint; the mock ignores the query string
    let fetched = store
        .dispatch("posts.fetch", json!({"author": 1, "draft": false}))
        .await
        .unwrap();
    assert_eq!(fetched.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_singleton_fetch_and_update() {
    let (store, _server) = blog_store();

    // pre-fetch state is empty
    assert_eq!(store.getter("profile").unwrap(), json!({}));

    let profile = store.dispatch("profile.fetch", json!(null)).await.unwrap();
    assert_eq!(profile["username"], json!("admin"));

    let profile = store.getter("profile").unwrap();
    assert_eq!(profile["username"], json!("admin"));

    let updated = store
        .dispatch("profile.update", json!({"username": "other"}))
        .await
        .unwrap();
    assert_eq!(updated["username"], json!("other"));

    let profile = store.getter("profile").unwrap();
    assert_eq!(profile["username"], json!("other"));
}

#[tokio::test]
async fn test_singleton_delete_resets_defaults() {
    let (store, _server) = blog_store();
    store.dispatch("profile.fetch", json!(null)).await.unwrap();

    store.dispatch("profile.delete", json!(null)).await.unwrap();

    let profile = store.getter("profile").unwrap();
    assert_eq!(profile["username"], json!("<anonymous>"));
}

#[tokio::test]
async fn test_unregistered_resource_rejects() {
    let (store, _server) = blog_store();
    let err = store.dispatch("comments.fetch", json!(null)).await.unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}
