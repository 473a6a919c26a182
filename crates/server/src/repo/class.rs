use shared_types::{AppError, Class, CreateClassRequest, UpdateClassRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Insert a new class. A duplicate code surfaces as a conflict.
pub async fn create(pool: &Pool<Postgres>, req: CreateClassRequest) -> Result<Class, AppError> {
    let row = sqlx::query_as::<_, Class>(
        r#"
        INSERT INTO classes (name, code, homeroom_teacher_id, academic_year)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, code, homeroom_teacher_id, academic_year, created_at, updated_at
        "#,
    )
    .bind(&req.name)
    .bind(&req.code)
    .bind(req.homeroom_teacher_id)
    .bind(&req.academic_year)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Find a class by ID.
pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Class>, AppError> {
    let row = sqlx::query_as::<_, Class>(
        r#"
        SELECT id, name, code, homeroom_teacher_id, academic_year, created_at, updated_at
        FROM classes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// List classes ordered by name with limit/offset paging.
pub async fn list(
    pool: &Pool<Postgres>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Class>, AppError> {
    let rows = sqlx::query_as::<_, Class>(
        r#"
        SELECT id, name, code, homeroom_teacher_id, academic_year, created_at, updated_at
        FROM classes
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

/// Update a class with only the provided fields.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: UpdateClassRequest,
) -> Result<Option<Class>, AppError> {
    let row = sqlx::query_as::<_, Class>(
        r#"
        UPDATE classes SET
            name                = COALESCE($2, name),
            code                = COALESCE($3, code),
            homeroom_teacher_id = COALESCE($4, homeroom_teacher_id),
            academic_year       = COALESCE($5, academic_year),
            updated_at          = NOW()
        WHERE id = $1
        RETURNING id, name, code, homeroom_teacher_id, academic_year, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.name)
    .bind(req.code)
    .bind(req.homeroom_teacher_id)
    .bind(req.academic_year)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Delete a class. Returns true if a row was deleted. Enrolled students
/// keep existing with `class_id` cleared by the FK.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM classes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
