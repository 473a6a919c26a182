use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    create_test_class, create_test_grade, create_test_student, create_test_token, delete_authed,
    get_authed, test_app,
};

#[tokio::test]
async fn teacher_deletes_grade() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Delete Target", "DEL-1").await;
    let class_id = class["id"].as_str().unwrap();
    let student = create_test_student(&app, "SV400", "Deletee", Some(class_id)).await;

    let grade = create_test_grade(
        &app,
        student["id"].as_str().unwrap(),
        class_id,
        "Geography",
        json!([{"name": "Quiz", "score": 5.0, "max_score": 10.0, "weight": 1.0}]),
    )
    .await;
    let grade_id = grade["id"].as_str().unwrap();

    let token = create_test_token("teacher");
    let (status, _) = delete_authed(&app, &format!("/api/v1/grades/{}", grade_id), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get_authed(&app, &format!("/api/v1/grades/{}", grade_id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_grade_cascades_to_assignments() {
    let (app, pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Cascade", "DEL-2").await;
    let class_id = class["id"].as_str().unwrap();
    let student = create_test_student(&app, "SV410", "Cascaded", Some(class_id)).await;

    let grade = create_test_grade(
        &app,
        student["id"].as_str().unwrap(),
        class_id,
        "Music",
        json!([
            {"name": "Theory", "score": 8.0, "max_score": 10.0, "weight": 1.0},
            {"name": "Practice", "score": 9.0, "max_score": 10.0, "weight": 1.0},
        ]),
    )
    .await;
    let grade_id = grade["id"].as_str().unwrap();
    let grade_uuid = uuid::Uuid::parse_str(grade_id).unwrap();

    let token = create_test_token("teacher");
    let (status, _) = delete_authed(&app, &format!("/api/v1/grades/{}", grade_id), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM grade_assignments WHERE grade_id = $1")
            .bind(grade_uuid)
            .fetch_one(&pool)
            .await
            .expect("Failed to count assignments");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn delete_unknown_grade_404() {
    let (app, _pool, _guard) = test_app().await;

    let token = create_test_token("teacher");
    let missing = uuid::Uuid::new_v4();
    let (status, _) = delete_authed(&app, &format!("/api/v1/grades/{}", missing), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_grade_requires_teacher_role() {
    let (app, _pool, _guard) = test_app().await;

    let class = create_test_class(&app, "Guarded Grades", "DEL-3").await;
    let class_id = class["id"].as_str().unwrap();
    let student = create_test_student(&app, "SV420", "Protected", Some(class_id)).await;

    let grade = create_test_grade(
        &app,
        student["id"].as_str().unwrap(),
        class_id,
        "Art",
        json!([{"name": "Portfolio", "score": 9.0, "max_score": 10.0, "weight": 1.0}]),
    )
    .await;
    let grade_id = grade["id"].as_str().unwrap();

    let token = create_test_token("student");
    let (status, _) = delete_authed(&app, &format!("/api/v1/grades/{}", grade_id), &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
