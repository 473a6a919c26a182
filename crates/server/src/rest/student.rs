use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared_types::{
    is_valid_gender, AppError, CreateStudentRequest, GradeResponse, Student, StudentResponse,
    UpdateStudentRequest, UserRole, GENDERS,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::auth::extractors::{AuthRequired, RoleRequired, ADMIN, TEACHER};
use crate::auth::jwt::Claims;
use crate::error_convert::ValidateRequest;

// ── Query parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct StudentListParams {
    /// Restrict to students enrolled in this class.
    pub class_id: Option<Uuid>,
    /// Page size, default 50, capped at 100.
    pub limit: Option<i64>,
    /// Rows to skip, default 0.
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct StudentSearchParams {
    /// Substring matched case-insensitively against name, MSSV and email.
    pub q: String,
}

/// Teachers and admins see every student; a student account only its own
/// linked record.
fn can_access_student(claims: &Claims, student: &Student) -> bool {
    let role = UserRole::from_str_or_default(&claims.role);
    role.satisfies(&UserRole::Teacher) || student.user_id == Some(claims.sub)
}

fn check_gender(gender: Option<&str>) -> Result<(), AppError> {
    if let Some(g) = gender {
        if !is_valid_gender(g) {
            return Err(AppError::bad_request(format!(
                "Invalid gender: {}. Valid values: {}",
                g,
                GENDERS.join(", ")
            )));
        }
    }
    Ok(())
}

// ── Student handlers ─────────────────────────────────────────────────

/// GET /api/v1/students
#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(StudentListParams),
    responses(
        (status = 200, description = "Students, newest first", body = Vec<StudentResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_students(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Query(params): Query<StudentListParams>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let students = crate::repo::student::list(&pool, params.class_id, limit, offset).await?;
    let responses: Vec<StudentResponse> =
        students.into_iter().map(StudentResponse::from).collect();

    Ok(Json(responses))
}

/// GET /api/v1/students/search
#[utoipa::path(
    get,
    path = "/api/v1/students/search",
    params(StudentSearchParams),
    responses(
        (status = 200, description = "Matching students", body = Vec<StudentResponse>),
        (status = 400, description = "Empty query", body = AppError),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn search_students(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Query(params): Query<StudentSearchParams>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(AppError::bad_request("Search query must not be empty"));
    }

    let students = crate::repo::student::search(&pool, q, 50).await?;
    let responses: Vec<StudentResponse> =
        students.into_iter().map(StudentResponse::from).collect();

    Ok(Json(responses))
}

/// GET /api/v1/students/{id}
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Student found", body = StudentResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not your record", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn get_student(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let student = crate::repo::student::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Student {} not found", id)))?;

    if !can_access_student(&auth.0, &student) {
        return Err(AppError::forbidden(
            "You may only view your own student record",
        ));
    }

    Ok(Json(StudentResponse::from(student)))
}

/// GET /api/v1/students/mssv/{mssv}
#[utoipa::path(
    get,
    path = "/api/v1/students/mssv/{mssv}",
    params(("mssv" = String, Path, description = "Enrollment code")),
    responses(
        (status = 200, description = "Student found", body = StudentResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn get_student_by_mssv(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(mssv): Path<String>,
) -> Result<Json<StudentResponse>, AppError> {
    let student = crate::repo::student::find_by_mssv(&pool, &mssv)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Student with MSSV {} not found", mssv)))?;

    Ok(Json(StudentResponse::from(student)))
}

/// GET /api/v1/students/{id}/grades
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/grades",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Grade sheets, newest first", body = Vec<GradeResponse>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not your record", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn list_student_grades(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<GradeResponse>>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let student = crate::repo::student::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Student {} not found", id)))?;

    if !can_access_student(&auth.0, &student) {
        return Err(AppError::forbidden(
            "You may only view your own student record",
        ));
    }

    let sheets = crate::repo::grade::list_by_student(&pool, uuid).await?;
    let responses: Vec<GradeResponse> = sheets
        .into_iter()
        .map(|(grade, assignments)| GradeResponse::from_parts(grade, assignments))
        .collect();

    Ok(Json(responses))
}

/// POST /api/v1/students
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 409, description = "MSSV already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn create_student(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), AppError> {
    payload.validate_request()?;
    check_gender(payload.gender.as_deref())?;

    let student = crate::repo::student::create(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

/// PUT /api/v1/students/{id}
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Teacher role required", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "MSSV already exists", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth, payload))]
pub async fn update_student(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<TEACHER>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    payload.validate_request()?;
    check_gender(payload.gender.as_deref())?;

    let student = crate::repo::student::update(&pool, uuid, payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Student {} not found", id)))?;

    Ok(Json(StudentResponse::from(student)))
}

/// DELETE /api/v1/students/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "students",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn delete_student(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| AppError::bad_request("Invalid UUID format"))?;

    let deleted = crate::repo::student::delete(&pool, uuid).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Student {} not found", id)))
    }
}
