use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    create_test_class, create_test_student, create_test_token, post_json, post_json_authed,
    test_app,
};

async fn seed_student_and_class(app: &axum::Router) -> (String, String) {
    let class = create_test_class(app, "Grade Target", "GRD-T1").await;
    let class_id = class["id"].as_str().unwrap().to_string();
    let student = create_test_student(app, "SV100", "Grade Me", Some(&class_id)).await;
    let student_id = student["id"].as_str().unwrap().to_string();
    (student_id, class_id)
}

#[tokio::test]
async fn create_grade_computes_final_grade() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Mathematics",
        "semester": "1",
        "school_year": "2024-2025",
        "assignments": [
            {"name": "Midterm", "score": 8.0, "max_score": 10.0, "weight": 1.0},
            {"name": "Final", "score": 9.0, "max_score": 10.0, "weight": 2.0},
        ],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["subject"], "Mathematics");
    assert_eq!(resp["semester"], "1");
    assert_eq!(resp["school_year"], "2024-2025");
    // (0.8*1 + 0.9*2) / 3 * 10 = 8.666..., rounded half-up to 8.67
    assert_eq!(resp["final_grade"], 8.67);
    assert_eq!(resp["classification"], "good");
    let assignments = resp["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0]["name"], "Midterm");
    assert_eq!(assignments[1]["name"], "Final");
}

#[tokio::test]
async fn create_grade_unknown_student_404() {
    let (app, _pool, _guard) = test_app().await;
    let (_, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": uuid::Uuid::new_v4(),
        "class_id": class_id,
        "subject": "Math",
        "assignments": [],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp["message"].as_str().unwrap().contains("Student"));
}

#[tokio::test]
async fn create_grade_unknown_class_404() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, _) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": uuid::Uuid::new_v4(),
        "subject": "Math",
        "assignments": [],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp["message"].as_str().unwrap().contains("Class"));
}

#[tokio::test]
async fn create_grade_empty_subject_422() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "",
        "assignments": [],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");
    assert!(resp["field_errors"]["subject"].as_str().is_some());
}

#[tokio::test]
async fn create_grade_negative_score_422() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Math",
        "assignments": [
            {"name": "Quiz", "score": -1.0, "max_score": 10.0, "weight": 1.0},
        ],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");
}

#[tokio::test]
async fn create_grade_zero_max_score_422() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Math",
        "assignments": [
            {"name": "Quiz", "score": 0.0, "max_score": 0.0, "weight": 1.0},
        ],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");
}

#[tokio::test]
async fn create_grade_zero_weights_has_no_final_grade() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Ungraded Seminar",
        "assignments": [
            {"name": "Attendance", "score": 1.0, "max_score": 1.0, "weight": 0.0},
        ],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(resp["final_grade"].is_null());
    assert!(resp["classification"].is_null());
}

#[tokio::test]
async fn create_grade_empty_assignments_allowed() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("teacher");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Pending Entry",
        "assignments": [],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(resp["assignments"].as_array().unwrap().is_empty());
    assert!(resp["final_grade"].is_null());
}

#[tokio::test]
async fn create_grade_requires_teacher_role() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let token = create_test_token("student");
    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Math",
        "assignments": [],
    });
    let (status, resp) = post_json_authed(&app, "/api/v1/grades", &body.to_string(), &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "teacher role or higher required");
}

#[tokio::test]
async fn create_grade_unauthenticated_401() {
    let (app, _pool, _guard) = test_app().await;
    let (student_id, class_id) = seed_student_and_class(&app).await;

    let body = json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": "Math",
        "assignments": [],
    });
    let (status, resp) = post_json(&app, "/api/v1/grades", &body.to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "Authentication required");
}
