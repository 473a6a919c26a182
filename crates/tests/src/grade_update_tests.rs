use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    create_test_class, create_test_grade, create_test_student, create_test_token,
    put_json_authed, test_app,
};

async fn seed_grade(app: &axum::Router) -> String {
    let class = create_test_class(app, "Update Target", "UPD-1").await;
    let class_id = class["id"].as_str().unwrap();
    let student = create_test_student(app, "SV300", "Updatee", Some(class_id)).await;

    let grade = create_test_grade(
        app,
        student["id"].as_str().unwrap(),
        class_id,
        "Literature",
        json!([
            {"name": "Midterm", "score": 6.0, "max_score": 10.0, "weight": 1.0},
            {"name": "Final", "score": 8.0, "max_score": 10.0, "weight": 1.0},
        ]),
    )
    .await;
    grade["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn update_grade_subject_only() {
    let (app, _pool, _guard) = test_app().await;
    let grade_id = seed_grade(&app).await;

    let token = create_test_token("teacher");
    let body = json!({"subject": "Vietnamese Literature"});
    let (status, resp) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", grade_id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["subject"], "Vietnamese Literature");
    // Assignments untouched: (0.6 + 0.8) / 2 * 10 = 7.0
    assert_eq!(resp["assignments"].as_array().unwrap().len(), 2);
    assert_eq!(resp["final_grade"], 7.0);
}

#[tokio::test]
async fn update_grade_semester_only() {
    let (app, _pool, _guard) = test_app().await;
    let grade_id = seed_grade(&app).await;

    let token = create_test_token("teacher");
    let body = json!({"semester": "2"});
    let (status, resp) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", grade_id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["semester"], "2");
    assert_eq!(resp["subject"], "Literature");
}

#[tokio::test]
async fn update_grade_replaces_assignments() {
    let (app, _pool, _guard) = test_app().await;
    let grade_id = seed_grade(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "assignments": [
            {"name": "Retake", "score": 10.0, "max_score": 10.0, "weight": 1.0},
        ],
    });
    let (status, resp) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", grade_id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let assignments = resp["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["name"], "Retake");
    assert_eq!(resp["final_grade"], 10.0);
    assert_eq!(resp["classification"], "excellent");
}

#[tokio::test]
async fn update_unknown_grade_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let missing = uuid::Uuid::new_v4();
    let body = json!({"subject": "Ghost"});
    let (status, _) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", missing),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_grade_empty_subject_422() {
    let (app, _pool, _guard) = test_app().await;
    let grade_id = seed_grade(&app).await;

    let token = create_test_token("teacher");
    let body = json!({"subject": ""});
    let (status, resp) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", grade_id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");
}

#[tokio::test]
async fn update_grade_requires_teacher_role() {
    let (app, _pool, _guard) = test_app().await;
    let grade_id = seed_grade(&app).await;

    let token = create_test_token("student");
    let body = json!({"subject": "Hijacked"});
    let (status, _) = put_json_authed(
        &app,
        &format!("/api/v1/grades/{}", grade_id),
        &body.to_string(),
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
