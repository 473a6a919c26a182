use axum::{extract::State, Json};
use shared_types::{AppError, DashboardStats, Student, StudentResponse};
use sqlx::{Pool, Postgres};

use crate::auth::extractors::{RoleRequired, TEACHER};
use crate::error_convert::SqlxErrorExt;

// ── Dashboard ────────────────────────────────────────────────────────

/// GET /api/v1/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "dashboard",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn get_dashboard_stats(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
) -> Result<Json<DashboardStats>, AppError> {
    let total_students = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let total_teachers = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teachers")
        .fetch_one(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let total_classes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes")
        .fetch_one(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let recent_students = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        ORDER BY created_at DESC, id DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .into_iter()
    .map(StudentResponse::from)
    .collect();

    Ok(Json(DashboardStats {
        total_students,
        total_teachers,
        total_classes,
        total_users,
        recent_students,
    }))
}
