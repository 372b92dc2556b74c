//! Signed URL and local file serving tests.
//!
//! Run with: `cargo test -p genstudio-api --test signed_urls_test`

mod helpers;

use bytes::Bytes;
use genstudio_storage::Storage;
use helpers::{setup_test_app, split_signed_url, UPLOADS_BUCKET, USER_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn test_signs_only_callers_paths() {
    let app = setup_test_app().await;
    let own = format!("{}/p1/hero.png", USER_ID);

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": [own, "user_2other/p1/hero.png"] }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let signed = body["signed_urls"].as_object().unwrap();
    assert_eq!(signed.len(), 1);
    assert!(signed.contains_key(&own));
    assert_eq!(body["expires_in"], 300);
}

#[tokio::test]
async fn test_parent_segments_do_not_escape_callers_prefix() {
    let app = setup_test_app().await;
    let escaping = format!("{}/../user_2other/p1/hero.png", USER_ID);

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": [escaping] }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["signed_urls"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_expiry_is_capped() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": [format!("{}/p1/a.png", USER_ID)], "expires_in": 86400 }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["expires_in"], 600);
}

#[tokio::test]
async fn test_value_is_resolved_in_place() {
    let app = setup_test_app().await;
    let own = format!("{}/p1/frame.png", USER_ID);

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({
            "value": {
                "cover": own,
                "gallery": [{ "src": "user_2other/p1/x.png" }, { "src": "https://cdn.test/a/b/c.png" }],
                "caption": "a/b testing"
            }
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let value = &response.json::<Value>()["value"];
    assert!(value["cover"].as_str().unwrap().contains("?token="));
    assert_eq!(value["gallery"][0]["src"], "user_2other/p1/x.png");
    assert_eq!(value["gallery"][1]["src"], "https://cdn.test/a/b/c.png");
    assert_eq!(value["caption"], "a/b testing");
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": [] }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_too_many_paths_are_rejected() {
    let app = setup_test_app().await;
    let paths: Vec<String> = (0..101).map(|i| format!("{}/p/{}.png", USER_ID, i)).collect();

    let response = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": paths }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_external_bucket_allow_list() {
    let app = setup_test_app().await;

    let denied = app
        .client()
        .post("/api/signed-urls/external")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "bucket": "billing-exports", "paths": ["a/b/c.csv"] }))
        .await;
    assert_eq!(denied.status_code(), 403);

    let allowed = app
        .client()
        .post("/api/signed-urls/external")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "bucket": "generated-videos", "paths": ["any/owner/clip.mp4"], "expires_in": 3600 }))
        .await;
    assert_eq!(allowed.status_code(), 200);
    let body: Value = allowed.json();
    assert_eq!(body["expires_in"], 120);
    assert!(body["signed_urls"]["any/owner/clip.mp4"]
        .as_str()
        .unwrap()
        .contains("/storage/local/generated-videos/"));
}

#[tokio::test]
async fn test_external_requires_paths() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/signed-urls/external")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "bucket": "user-uploads", "paths": [] }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_signed_url_serves_local_object() {
    let app = setup_test_app().await;
    let object = format!("{}/p1/hero.png", USER_ID);
    app.state
        .storage
        .upload(UPLOADS_BUCKET, &object, "image/png", Bytes::from_static(b"png-bytes"))
        .await
        .unwrap();

    let signed = app
        .client()
        .post("/api/signed-urls")
        .add_header("Authorization", app.bearer(USER_ID))
        .json(&json!({ "paths": [object] }))
        .await;
    let url = signed.json::<Value>()["signed_urls"][&object]
        .as_str()
        .unwrap()
        .to_string();
    let (path, token) = split_signed_url(&url);

    let response = app
        .client()
        .get(&path)
        .add_query_param("token", &token)
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(&response.as_bytes()[..], b"png-bytes");
}

#[tokio::test]
async fn test_local_object_requires_valid_token() {
    let app = setup_test_app().await;
    let path = format!("/storage/local/{}/{}/p1/hero.png", UPLOADS_BUCKET, USER_ID);

    let missing = app.client().get(&path).await;
    assert_eq!(missing.status_code(), 401);

    let forged = app
        .client()
        .get(&path)
        .add_query_param("token", "9999999999.deadbeef")
        .await;
    assert_eq!(forged.status_code(), 403);
}
