use shared_types::{AppError, CreateStudentRequest, Student, UpdateStudentRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Insert a new student. A duplicate MSSV surfaces as a conflict.
pub async fn create(
    pool: &Pool<Postgres>,
    req: CreateStudentRequest,
) -> Result<Student, AppError> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        INSERT INTO students
            (mssv, name, date_of_birth, gender, email, phone, address, class_id, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, mssv, name, date_of_birth, gender, email, phone, address,
                  class_id, user_id, created_at, updated_at
        "#,
    )
    .bind(&req.mssv)
    .bind(&req.name)
    .bind(req.date_of_birth)
    .bind(&req.gender)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(req.class_id)
    .bind(req.user_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Find a student by ID.
pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Student>, AppError> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Find a student by enrollment code (MSSV).
pub async fn find_by_mssv(
    pool: &Pool<Postgres>,
    mssv: &str,
) -> Result<Option<Student>, AppError> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE mssv = $1
        "#,
    )
    .bind(mssv)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Find the student record linked to a login account, if any.
pub async fn find_by_user_id(
    pool: &Pool<Postgres>,
    user_id: i64,
) -> Result<Option<Student>, AppError> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// List students newest-first with limit/offset paging, optionally
/// restricted to one class.
pub async fn list(
    pool: &Pool<Postgres>,
    class_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Student>, AppError> {
    let rows = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE ($1::UUID IS NULL OR class_id = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(class_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Case-insensitive substring search over name, MSSV and email.
pub async fn search(
    pool: &Pool<Postgres>,
    q: &str,
    limit: i64,
) -> Result<Vec<Student>, AppError> {
    let pattern = format!("%{}%", q);
    let rows = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE name ILIKE $1 OR mssv ILIKE $1 OR email ILIKE $1
        ORDER BY name ASC
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// List all students enrolled in a class, ordered by name.
pub async fn list_by_class(
    pool: &Pool<Postgres>,
    class_id: Uuid,
) -> Result<Vec<Student>, AppError> {
    let rows = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, mssv, name, date_of_birth, gender, email, phone, address,
               class_id, user_id, created_at, updated_at
        FROM students
        WHERE class_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Update a student with only the provided fields.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: UpdateStudentRequest,
) -> Result<Option<Student>, AppError> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        UPDATE students SET
            mssv          = COALESCE($2, mssv),
            name          = COALESCE($3, name),
            date_of_birth = COALESCE($4, date_of_birth),
            gender        = COALESCE($5, gender),
            email         = COALESCE($6, email),
            phone         = COALESCE($7, phone),
            address       = COALESCE($8, address),
            class_id      = COALESCE($9, class_id),
            user_id       = COALESCE($10, user_id),
            updated_at    = NOW()
        WHERE id = $1
        RETURNING id, mssv, name, date_of_birth, gender, email, phone, address,
                  class_id, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.mssv)
    .bind(req.name)
    .bind(req.date_of_birth)
    .bind(req.gender)
    .bind(req.email)
    .bind(req.phone)
    .bind(req.address)
    .bind(req.class_id)
    .bind(req.user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row)
}

/// Delete a student. Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
