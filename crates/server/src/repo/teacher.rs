use shared_types::{AppError, CreateTeacherRequest, Teacher, UpdateTeacherRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Insert a new teacher. A duplicate email surfaces as a conflict.
pub async fn create(
    pool: &Pool<Postgres>,
    req: CreateTeacherRequest,
) -> Result<Teacher, AppError> {
    let row = sqlx::query_as::<_, Teacher>(
        r#"
        INSERT INTO teachers (name, email, phone, department, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, phone, department, user_id, created_at, updated_at
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.department)
    .bind(req.user_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Find a teacher by ID.
pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Teacher>, AppError> {
    let row = sqlx::query_as::<_, Teacher>(
        r#"
        SELECT id, name, email, phone, department, user_id, created_at, updated_at
        FROM teachers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// List teachers ordered by name with limit/offset paging.
pub async fn list(
    pool: &Pool<Postgres>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Teacher>, AppError> {
    let rows = sqlx::query_as::<_, Teacher>(
        r#"
        SELECT id, name, email, phone, department, user_id, created_at, updated_at
        FROM teachers
        ORDER BY name ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Update a teacher with only the provided fields.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: UpdateTeacherRequest,
) -> Result<Option<Teacher>, AppError> {
    let row = sqlx::query_as::<_, Teacher>(
        r#"
        UPDATE teachers SET
            name       = COALESCE($2, name),
            email      = COALESCE($3, email),
            phone      = COALESCE($4, phone),
            department = COALESCE($5, department),
            user_id    = COALESCE($6, user_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, email, phone, department, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.name)
    .bind(req.email)
    .bind(req.phone)
    .bind(req.department)
    .bind(req.user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Delete a teacher. Returns true if a row was deleted. Classes keep
/// existing with `homeroom_teacher_id` cleared by the FK.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM teachers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}

/// List the classes a teacher is homeroom teacher of.
pub async fn list_classes(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
) -> Result<Vec<shared_types::Class>, AppError> {
    let rows = sqlx::query_as::<_, shared_types::Class>(
        r#"
        SELECT id, name, code, homeroom_teacher_id, academic_year, created_at, updated_at
        FROM classes
        WHERE homeroom_teacher_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}
