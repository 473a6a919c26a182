use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared_types::{
    AppError, ClassResponse, ClassStatistics, CreateClassRequest, StudentResponse,
    UpdateClassRequest,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::auth::extractors::{AuthRequired, RoleRequired, ADMIN, TEACHER};
use crate::error_convert::ValidateRequest;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ClassListParams {
    /// Page size, default 50, capped at 100.
    pub limit: Option<i64>,
    /// Rows to skip, default 0.
    pub offset: Option<i64>,
}

// ── Class handlers ───────────────────────────────────────────────────

/// GET /api/v1/classes
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    params(ClassListParams),
    responses(
        (status = 200, description = "Classes ordered by name", body = Vec<ClassResponse>),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_classes(
    State(pool): State<Pool<Postgres>>,
    _auth: AuthRequired,
    Query(params): Query<ClassListParams>,
) -> Result<Json<Vec<ClassResponse>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let classes = crate::repo::class::list(&pool, limit, offset).await?;
    let responses: Vec<ClassResponse> = classes.into_iter().map(ClassResponse::from).collect();

    Ok(Json(responses))
}

/// GET /api/v1/classes/{id}
#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}",
    params(("id" = String, Path, description = "Class UUID")),
    responses(
        (status = 200, description = "Class found", body = ClassResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn get_class(
    State(pool): State<Pool<Postgres>>,
    _auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<ClassResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let class = crate::repo::class::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Class {} not found", id)))?;

    Ok(Json(ClassResponse::from(class)))
}

/// GET /api/v1/classes/{id}/students
#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}/students",
    params(("id" = String, Path, description = "Class UUID")),
    responses(
        (status = 200, description = "Roster ordered by name", body = Vec<StudentResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_class_students(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    crate::repo::class::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Class {} not found", id)))?;

    let students = crate::repo::student::list_by_class(&pool, uuid).await?;
    let responses: Vec<StudentResponse> =
        students.into_iter().map(StudentResponse::from).collect();

    Ok(Json(responses))
}

/// GET /api/v1/classes/{id}/statistics
#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}/statistics",
    params(("id" = String, Path, description = "Class UUID")),
    responses(
        (status = 200, description = "Grade statistics for the class", body = ClassStatistics),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn class_statistics(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
) -> Result<Json<ClassStatistics>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    crate::repo::class::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Class {} not found", id)))?;

    let stats = crate::repo::grade::class_statistics(&pool, uuid).await?;
    Ok(Json(stats))
}

/// POST /api/v1/classes
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 409, description = "Class code already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn create_class(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassResponse>), AppError> {
    payload.validate_request()?;

    let class = crate::repo::class::create(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(ClassResponse::from(class))))
}

/// PUT /api/v1/classes/{id}
#[utoipa::path(
    put,
    path = "/api/v1/classes/{id}",
    params(("id" = String, Path, description = "Class UUID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Class code already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn update_class(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateClassRequest>,
) -> Result<Json<ClassResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    payload.validate_request()?;

    let class = crate::repo::class::update(&pool, uuid, payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Class {} not found", id)))?;

    Ok(Json(ClassResponse::from(class)))
}

/// DELETE /api/v1/classes/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}",
    params(("id" = String, Path, description = "Class UUID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "classes",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn delete_class(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let deleted = crate::repo::class::delete(&pool, uuid).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Class {} not found", id)))
    }
}
