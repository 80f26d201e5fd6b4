use super::*;
use axum::body::Body;
use axum::http::{Method, Request};
use http_body_util::BodyExt;
use mdr_core::{Author, CoreConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> (TempDir, Router) {
    let temp = TempDir::new().unwrap();
    let cfg = CoreConfig::new(temp.path().to_path_buf(), Author::new("tester", None).unwrap())
        .unwrap();
    let services = MdrServices::new(Arc::new(cfg)).unwrap();
    (temp, router(services))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-author-name", "x");
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_is_ok() {
    let (_temp, app) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn activity_lifecycle_over_http() {
    let (_temp, app) = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/activities",
        Some(json!({"library_name": "Sponsor", "name": "A", "name_sentence_case": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], json!("0.1"));
    assert_eq!(created["status"], json!("Draft"));
    assert_eq!(created["author_username"], json!("x"));
    assert_eq!(created["possible_actions"], json!(["approve", "delete", "edit"]));
    let uid = created["uid"].as_str().unwrap().to_string();

    let (status, approved) =
        send(&app, Method::POST, &format!("/activities/{uid}/approvals"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(approved["version"], json!("1.0"));

    let (status, err) =
        send(&app, Method::POST, &format!("/activities/{uid}/approvals"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["type"], json!("VersioningException"));
    assert_eq!(err["message"], json!("Only DRAFT version can be approved."));

    let (status, draft) =
        send(&app, Method::POST, &format!("/activities/{uid}/versions"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["version"], json!("1.1"));

    let (status, edited) = send(
        &app,
        Method::PATCH,
        &format!("/activities/{uid}"),
        Some(json!({"change_description": "rename", "name": "B", "name_sentence_case": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["version"], json!("1.2"));
    assert_eq!(edited["name"], json!("B"));

    send(&app, Method::POST, &format!("/activities/{uid}/approvals"), None).await;

    let (status, history) =
        send(&app, Method::GET, &format!("/activities/{uid}/versions"), None).await;
    assert_eq!(status, StatusCode::OK);
    let versions: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version"].as_str().unwrap())
        .collect();
    assert_eq!(versions, vec!["0.1", "1.0", "1.1", "1.2", "2.0"]);
    assert_eq!(history[3]["changes"]["name"], json!(true));

    let (status, old) = send(
        &app,
        Method::GET,
        &format!("/activities/{uid}?version=1.0"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(old["name"], json!("A"));

    let (status, retired) =
        send(&app, Method::DELETE, &format!("/activities/{uid}/activations"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retired["status"], json!("Retired"));

    let (status, active) =
        send(&app, Method::POST, &format!("/activities/{uid}/activations"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["status"], json!("Final"));
}

#[tokio::test]
async fn errors_carry_type_and_message() {
    let (_temp, app) = app();

    let (status, err) = send(&app, Method::GET, "/activity-groups/0123456789abcdef0123456789abcdef", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["type"], json!("NotFoundException"));

    let (status, err) = send(
        &app,
        Method::POST,
        "/activity-groups",
        Some(json!({"library_name": "Missing", "name": "G", "name_sentence_case": "g"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["type"], json!("BusinessLogicException"));

    let body = json!({"library_name": "Sponsor", "name": "G", "name_sentence_case": "g"});
    send(&app, Method::POST, "/activity-groups", Some(body.clone())).await;
    let (status, err) = send(&app, Method::POST, "/activity-groups", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["type"], json!("AlreadyExistsException"));

    let (status, err) = send(
        &app,
        Method::POST,
        "/activity-groups",
        Some(json!({"library_name": "Sponsor", "name": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["type"], json!("ValidationException"));
}

#[tokio::test]
async fn soft_delete_returns_no_content() {
    let (_temp, app) = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/odm-forms",
        Some(json!({"library_name": "Sponsor", "name": "Vitals"})),
    )
    .await;
    assert_eq!(created["oid"], json!("F.Vitals"));
    let uid = created["uid"].as_str().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/odm-forms/{uid}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, page) = send(&app, Method::GET, "/odm-forms?total_count=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(0));
}

#[tokio::test]
async fn libraries_can_be_listed_and_created() {
    let (_temp, app) = app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/libraries",
        Some(json!({"name": "Requested"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_editable"], json!(true));

    let (_, all) = send(&app, Method::GET, "/libraries", None).await;
    let names: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["CDISC", "Requested", "Sponsor"]);
}

#[tokio::test]
async fn audit_trail_lists_versions_newest_first() {
    let (_temp, app) = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/activity-groups",
        Some(json!({"library_name": "Sponsor", "name": "G", "name_sentence_case": "g"})),
    )
    .await;
    let uid = created["uid"].as_str().unwrap();
    send(&app, Method::POST, &format!("/activity-groups/{uid}/approvals"), None).await;

    let (status, page) = send(
        &app,
        Method::GET,
        "/activity-groups/audit-trail?total_count=true",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["items"][0]["version"], json!("1.0"));
}

async fn send_raw(app: &Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn approved_activity(app: &Router) -> String {
    let (_, created) = send(
        app,
        Method::POST,
        "/activities",
        Some(json!({"library_name": "Sponsor", "name": "A", "name_sentence_case": "a"})),
    )
    .await;
    let uid = created["uid"].as_str().unwrap().to_string();
    send(app, Method::POST, &format!("/activities/{uid}/approvals"), None).await;
    uid
}

#[tokio::test]
async fn new_version_rejects_malformed_body() {
    let (_temp, app) = app();
    let uid = approved_activity(&app).await;
    let uri = format!("/activities/{uid}/versions");

    let (status, err) = send_raw(&app, &uri, "application/json", r#"{"name": "B", oops"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["type"], json!("ValidationException"));

    let (status, err) = send_raw(&app, &uri, "text/plain", r#"{"name": "B"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["type"], json!("ValidationException"));

    let (status, latest) = send(&app, Method::GET, &format!("/activities/{uid}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["version"], json!("1.0"));
    assert_eq!(latest["status"], json!("Final"));
}

#[tokio::test]
async fn new_version_applies_replacement_fields() {
    let (_temp, app) = app();
    let uid = approved_activity(&app).await;

    let (status, draft) = send(
        &app,
        Method::POST,
        &format!("/activities/{uid}/versions"),
        Some(json!({"change_description": "renamed", "name": "B", "name_sentence_case": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["version"], json!("1.1"));
    assert_eq!(draft["status"], json!("Draft"));
    assert_eq!(draft["name"], json!("B"));
    assert_eq!(draft["change_description"], json!("renamed"));

    let (_, old) = send(&app, Method::GET, &format!("/activities/{uid}?version=1.0"), None).await;
    assert_eq!(old["name"], json!("A"));
}
