use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared_types::{
    AppError, CreateGradeRequest, GradeResponse, UpdateGradeRequest, UserRole,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::auth::extractors::{AuthRequired, RoleRequired, TEACHER};
use crate::error_convert::ValidateRequest;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct GradeListParams {
    pub student_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub semester: Option<String>,
    pub school_year: Option<String>,
    /// Page size, default 50, capped at 100.
    pub limit: Option<i64>,
    /// Rows to skip, default 0.
    pub offset: Option<i64>,
}

// ── Grade handlers ───────────────────────────────────────────────────

/// GET /api/v1/grades
#[utoipa::path(
    get,
    path = "/api/v1/grades",
    params(GradeListParams),
    responses(
        (status = 200, description = "Grade sheets, newest first", body = Vec<GradeResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError)
    ),
    tag = "grades",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_grades(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Query(params): Query<GradeListParams>,
) -> Result<Json<Vec<GradeResponse>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let sheets = crate::repo::grade::list(
        &pool,
        params.student_id,
        params.class_id,
        params.semester.as_deref(),
        params.school_year.as_deref(),
        limit,
        offset,
    )
    .await?;

    let responses: Vec<GradeResponse> = sheets
        .into_iter()
        .map(|(grade, assignments)| GradeResponse::from_parts(grade, assignments))
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/grades/{id}
#[utoipa::path(
    get,
    path = "/api/v1/grades/{id}",
    params(("id" = String, Path, description = "Grade UUID")),
    responses(
        (status = 200, description = "Grade sheet with computed final grade", body = GradeResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not your grade sheet", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "grades",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn get_grade(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<GradeResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let (grade, assignments) = crate::repo::grade::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Grade {} not found", id)))?;

    let role = UserRole::from_str_or_default(&auth.0.role);
    if !role.satisfies(&UserRole::Teacher) {
        // A student account may only read sheets of its own linked record
        let own = crate::repo::student::find_by_user_id(&pool, auth.0.sub).await?;
        let owns = own.map(|s| s.id == grade.student_id).unwrap_or(false);
        if !owns {
            return Err(AppError::forbidden("You may only view your own grades"));
        }
    }

    Ok(Json(GradeResponse::from_parts(grade, assignments)))
}

/// POST /api/v1/grades
#[utoipa::path(
    post,
    path = "/api/v1/grades",
    request_body = CreateGradeRequest,
    responses(
        (status = 201, description = "Grade sheet created", body = GradeResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Student or class not found", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "grades",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn create_grade(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Json(payload): Json<CreateGradeRequest>,
) -> Result<(StatusCode, Json<GradeResponse>), AppError> {
    payload.validate_request()?;

    // Fail with 404 before writing anything
    crate::repo::student::find_by_id(&pool, payload.student_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Student {} not found", payload.student_id))
        })?;
    crate::repo::class::find_by_id(&pool, payload.class_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Class {} not found", payload.class_id)))?;

    let (grade, assignments) = crate::repo::grade::create(&pool, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(GradeResponse::from_parts(grade, assignments)),
    ))
}

/// PUT /api/v1/grades/{id}
#[utoipa::path(
    put,
    path = "/api/v1/grades/{id}",
    params(("id" = String, Path, description = "Grade UUID")),
    request_body = UpdateGradeRequest,
    responses(
        (status = 200, description = "Grade sheet updated", body = GradeResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "grades",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn update_grade(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGradeRequest>,
) -> Result<Json<GradeResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    payload.validate_request()?;

    let (grade, assignments) = crate::repo::grade::update(&pool, uuid, payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Grade {} not found", id)))?;

    Ok(Json(GradeResponse::from_parts(grade, assignments)))
}

/// DELETE /api/v1/grades/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/grades/{id}",
    params(("id" = String, Path, description = "Grade UUID")),
    responses(
        (status = 204, description = "Grade sheet deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "grades",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn delete_grade(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let deleted = crate::repo::grade::delete(&pool, uuid).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Grade {} not found", id)))
    }
}
