pub mod auth;
pub mod class;
pub mod dashboard;
pub mod grade;
pub mod student;
pub mod teacher;
pub mod user;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::db::AppState;

/// All v1 API routes. Paths are relative, without the /api prefix.
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Users
        .route("/users", get(user::list_users))
        .route(
            "/users/{user_id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/users/{user_id}/role", put(user::update_user_role))
        // Students
        .route(
            "/students",
            get(student::list_students).post(student::create_student),
        )
        .route("/students/search", get(student::search_students))
        .route("/students/mssv/{mssv}", get(student::get_student_by_mssv))
        .route(
            "/students/{id}",
            get(student::get_student)
                .put(student::update_student)
                .delete(student::delete_student),
        )
        .route("/students/{id}/grades", get(student::list_student_grades))
        // Teachers
        .route(
            "/teachers",
            get(teacher::list_teachers).post(teacher::create_teacher),
        )
        .route(
            "/teachers/{id}",
            get(teacher::get_teacher)
                .put(teacher::update_teacher)
                .delete(teacher::delete_teacher),
        )
        .route("/teachers/{id}/classes", get(teacher::list_teacher_classes))
        // Classes
        .route(
            "/classes",
            get(class::list_classes).post(class::create_class),
        )
        .route(
            "/classes/{id}",
            get(class::get_class)
                .put(class::update_class)
                .delete(class::delete_class),
        )
        .route("/classes/{id}/students", get(class::list_class_students))
        .route("/classes/{id}/statistics", get(class::class_statistics))
        // Grades
        .route("/grades", get(grade::list_grades).post(grade::create_grade))
        .route(
            "/grades/{id}",
            get(grade::get_grade)
                .put(grade::update_grade)
                .delete(grade::delete_grade),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_dashboard_stats))
}

/// Build the REST API router with all resource routes.
pub fn rest_router() -> Router<AppState> {
    let mut router = Router::new().nest("/api/v1", api_v1_routes());

    // Backward-compat: unversioned /api/* alias (controlled by env var)
    if std::env::var("API_ENABLE_UNVERSIONED")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true)
    {
        router = router.nest("/api", api_v1_routes());
    }

    router
}

/// Build the REST API router with rate limiting applied.
pub fn api_router_with_rate_limit(
    rate_limit: crate::rate_limit::RateLimitState,
) -> Router<AppState> {
    rest_router().layer(axum::middleware::from_fn_with_state(
        rate_limit,
        crate::rate_limit::rate_limit_middleware,
    ))
}
