use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared_types::{
    AppError, ClassResponse, CreateTeacherRequest, TeacherResponse, UpdateTeacherRequest,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::auth::extractors::{RoleRequired, ADMIN, TEACHER};
use crate::error_convert::ValidateRequest;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct TeacherListParams {
    /// Page size, default 50, capped at 100.
    pub limit: Option<i64>,
    /// Rows to skip, default 0.
    pub offset: Option<i64>,
}

// ── Teacher handlers ─────────────────────────────────────────────────

/// GET /api/v1/teachers
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    params(TeacherListParams),
    responses(
        (status = 200, description = "Teachers ordered by name", body = Vec<TeacherResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_teachers(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Query(params): Query<TeacherListParams>,
) -> Result<Json<Vec<TeacherResponse>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let teachers = crate::repo::teacher::list(&pool, limit, offset).await?;
    let responses: Vec<TeacherResponse> =
        teachers.into_iter().map(TeacherResponse::from).collect();

    Ok(Json(responses))
}

/// GET /api/v1/teachers/{id}
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}",
    params(("id" = String, Path, description = "Teacher UUID")),
    responses(
        (status = 200, description = "Teacher found", body = TeacherResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn get_teacher(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
) -> Result<Json<TeacherResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let teacher = crate::repo::teacher::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Teacher {} not found", id)))?;

    Ok(Json(TeacherResponse::from(teacher)))
}

/// GET /api/v1/teachers/{id}/classes
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/classes",
    params(("id" = String, Path, description = "Teacher UUID")),
    responses(
        (status = 200, description = "Classes with this homeroom teacher", body = Vec<ClassResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_teacher_classes(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ClassResponse>>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    crate::repo::teacher::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Teacher {} not found", id)))?;

    let classes = crate::repo::teacher::list_classes(&pool, uuid).await?;
    let responses: Vec<ClassResponse> = classes.into_iter().map(ClassResponse::from).collect();

    Ok(Json(responses))
}

/// POST /api/v1/teachers
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = TeacherResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 409, description = "Email already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn create_teacher(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Json(payload): Json<CreateTeacherRequest>,
) -> Result<(StatusCode, Json<TeacherResponse>), AppError> {
    payload.validate_request()?;

    let teacher = crate::repo::teacher::create(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(TeacherResponse::from(teacher))))
}

/// PUT /api/v1/teachers/{id}
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{id}",
    params(("id" = String, Path, description = "Teacher UUID")),
    request_body = UpdateTeacherRequest,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Email already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn update_teacher(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeacherRequest>,
) -> Result<Json<TeacherResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    payload.validate_request()?;

    let teacher = crate::repo::teacher::update(&pool, uuid, payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Teacher {} not found", id)))?;

    Ok(Json(TeacherResponse::from(teacher)))
}

/// DELETE /api/v1/teachers/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{id}",
    params(("id" = String, Path, description = "Teacher UUID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "teachers",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn delete_teacher(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let deleted = crate::repo::teacher::delete(&pool, uuid).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Teacher {} not found", id)))
    }
}
