use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    create_test_class, create_test_student, create_test_token, delete_authed, get, get_authed,
    post_json_authed, put_json_authed, test_app,
};

#[tokio::test]
async fn create_class_success() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("admin");
    let body = json!({
        "name": "Cong Nghe Thong Tin K19A",
        "code": "CNTT-K19A",
        "academic_year": "2024-2025",
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/classes", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["name"], "Cong Nghe Thong Tin K19A");
    assert_eq!(resp["code"], "CNTT-K19A");
    assert_eq!(resp["academic_year"], "2024-2025");
    assert!(resp["id"].as_str().is_some());
}

#[tokio::test]
async fn create_class_requires_admin() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let body = json!({"name": "Nope", "code": "NOPE-1"});
    let (status, _) = post_json_authed(&app, "/api/v1/classes", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_class_empty_name_422() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("admin");
    let body = json!({"name": "", "code": "EMPTY-1"});
    let (status, resp) = post_json_authed(&app, "/api/v1/classes", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["name"].as_str().is_some());
}

#[tokio::test]
async fn create_class_duplicate_code_409() {
    let (app, _pool, _guard) = test_app().await;

    create_test_class(&app, "Original", "DUP-01").await;

    let token = create_test_token("admin");
    let body = json!({"name": "Copycat", "code": "DUP-01"});
    let (status, resp) = post_json_authed(&app, "/api/v1/classes", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["message"], "A class with this code already exists");
}

#[tokio::test]
async fn any_authenticated_role_reads_classes() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Open Book", "OPEN-1").await;
    let id = class["id"].as_str().unwrap();

    // Students can browse classes; only writes are restricted.
    let token = create_test_token("student");
    let (status, resp) = get_authed(&app, &format!("/api/v1/classes/{}", id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["code"], "OPEN-1");

    let (status, resp) = get_authed(&app, "/api/v1/classes", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_class_unauthenticated_401() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Locked Out", "LOCK-1").await;
    let id = class["id"].as_str().unwrap();

    let (status, resp) = get(&app, &format!("/api/v1/classes/{}", id)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "Authentication required");
}

#[tokio::test]
async fn get_unknown_class_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let missing = uuid::Uuid::new_v4();
    let (status, resp) = get_authed(&app, &format!("/api/v1/classes/{}", missing), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["kind"], "NotFound");
}

#[tokio::test]
async fn get_class_invalid_uuid_400() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let (status, resp) = get_authed(&app, "/api/v1/classes/not-a-uuid", &token).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Invalid UUID format");
}

#[tokio::test]
async fn list_classes_ordered_by_name() {
    let (app, _pool, _guard) = test_app().await;

    create_test_class(&app, "Zebra Class", "Z-01").await;
    create_test_class(&app, "Aardvark Class", "A-01").await;

    let token = create_test_token("student");
    let (status, resp) = get_authed(&app, "/api/v1/classes", &token).await;

    assert_eq!(status, StatusCode::OK);
    let classes = resp.as_array().unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0]["name"], "Aardvark Class");
    assert_eq!(classes[1]["name"], "Zebra Class");
}

#[tokio::test]
async fn update_class_partial() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Before Rename", "REN-1").await;
    let id = class["id"].as_str().unwrap();

    let token = create_test_token("admin");
    let body = json!({"name": "After Rename"});
    let (status, resp) = put_json_authed(
        &app,
        &format!("/api/v1/classes/{}", id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["name"], "After Rename");
    assert_eq!(resp["code"], "REN-1");
}

#[tokio::test]
async fn update_class_requires_admin() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Guarded", "GRD-1").await;
    let id = class["id"].as_str().unwrap();

    let token = create_test_token("teacher");
    let body = json!({"name": "Hijacked"});
    let (status, _) = put_json_authed(
        &app,
        &format!("/api/v1/classes/{}", id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_unknown_class_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("admin");
    let missing = uuid::Uuid::new_v4();
    let body = json!({"name": "Ghost"});
    let (status, _) = put_json_authed(
        &app,
        &format!("/api/v1/classes/{}", missing),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_deletes_class() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Doomed", "DOOM-1").await;
    let id = class["id"].as_str().unwrap();

    let token = create_test_token("admin");
    let (status, _) = delete_authed(&app, &format!("/api/v1/classes/{}", id), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get_authed(&app, &format!("/api/v1/classes/{}", id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_class_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("admin");
    let missing = uuid::Uuid::new_v4();
    let (status, _) = delete_authed(&app, &format!("/api/v1/classes/{}", missing), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roster_lists_class_members_ordered_by_name() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Rostered", "ROS-1").await;
    let class_id = class["id"].as_str().unwrap();

    create_test_student(&app, "SV800", "Zelda In", Some(class_id)).await;
    create_test_student(&app, "SV801", "Arthur In", Some(class_id)).await;
    create_test_student(&app, "SV802", "Outsider", None).await;

    let token = create_test_token("teacher");
    let (status, resp) = get_authed(
        &app,
        &format!("/api/v1/classes/{}/students", class_id),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let roster = resp.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["name"], "Arthur In");
    assert_eq!(roster[1]["name"], "Zelda In");
}

#[tokio::test]
async fn roster_unknown_class_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let missing = uuid::Uuid::new_v4();
    let (status, _) = get_authed(
        &app,
        &format!("/api/v1/classes/{}/students", missing),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roster_requires_teacher_role() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Hidden Roster", "HID-1").await;
    let id = class["id"].as_str().unwrap();

    let token = create_test_token("student");
    let (status, _) = get_authed(&app, &format!("/api/v1/classes/{}/students", id), &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
