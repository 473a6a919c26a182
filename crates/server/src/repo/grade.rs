use std::collections::HashMap;

use shared_types::grading::{self, GradeBand, GradeDistribution};
use shared_types::{
    AppError, Assignment, ClassStatistics, CreateGradeRequest, Grade, UpdateGradeRequest,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Insert a new grade sheet together with its assignment list, atomically.
/// Assignment positions follow the order of the request.
pub async fn create(
    pool: &Pool<Postgres>,
    req: CreateGradeRequest,
) -> Result<(Grade, Vec<Assignment>), AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let grade = sqlx::query_as::<_, Grade>(
        r#"
        INSERT INTO grades (student_id, class_id, subject, semester, school_year)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, student_id, class_id, subject, semester, school_year,
                  created_at, updated_at
        "#,
    )
    .bind(req.student_id)
    .bind(req.class_id)
    .bind(&req.subject)
    .bind(&req.semester)
    .bind(&req.school_year)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let assignments = insert_assignments(&mut tx, grade.id, &req.assignments).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    Ok((grade, assignments))
}

/// Find a grade sheet by ID, with its assignments in position order.
pub async fn find_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<(Grade, Vec<Assignment>)>, AppError> {
    let grade = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, student_id, class_id, subject, semester, school_year,
               created_at, updated_at
        FROM grades
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let grade = match grade {
        Some(g) => g,
        None => return Ok(None),
    };

    let assignments = list_assignments(pool, id).await?;
    Ok(Some((grade, assignments)))
}

/// List a grade sheet's assignments in position order.
pub async fn list_assignments(
    pool: &Pool<Postgres>,
    grade_id: Uuid,
) -> Result<Vec<Assignment>, AppError> {
    let rows = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, grade_id, name, score, max_score, weight, position
        FROM grade_assignments
        WHERE grade_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(grade_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// List grade sheets newest-first with optional filters and limit/offset
/// paging, each with its assignments.
pub async fn list(
    pool: &Pool<Postgres>,
    student_id: Option<Uuid>,
    class_id: Option<Uuid>,
    semester: Option<&str>,
    school_year: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<(Grade, Vec<Assignment>)>, AppError> {
    let grades = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, student_id, class_id, subject, semester, school_year,
               created_at, updated_at
        FROM grades
        WHERE ($1::UUID IS NULL OR student_id = $1)
          AND ($2::UUID IS NULL OR class_id = $2)
          AND ($3::TEXT IS NULL OR semester = $3)
          AND ($4::TEXT IS NULL OR school_year = $4)
        ORDER BY created_at DESC, id DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(student_id)
    .bind(class_id)
    .bind(semester)
    .bind(school_year)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    attach_assignments(pool, grades).await
}

/// List all grade sheets for a student, newest first, each with its
/// assignments.
pub async fn list_by_student(
    pool: &Pool<Postgres>,
    student_id: Uuid,
) -> Result<Vec<(Grade, Vec<Assignment>)>, AppError> {
    let grades = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, student_id, class_id, subject, semester, school_year,
               created_at, updated_at
        FROM grades
        WHERE student_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    attach_assignments(pool, grades).await
}

/// List all grade sheets recorded in a class, newest first, each with
/// its assignments.
pub async fn list_by_class(
    pool: &Pool<Postgres>,
    class_id: Uuid,
) -> Result<Vec<(Grade, Vec<Assignment>)>, AppError> {
    let grades = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, student_id, class_id, subject, semester, school_year,
               created_at, updated_at
        FROM grades
        WHERE class_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    attach_assignments(pool, grades).await
}

/// Update a grade sheet with only the provided fields. When the request
/// carries an assignment list, the stored list is replaced wholesale in
/// the same transaction.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: UpdateGradeRequest,
) -> Result<Option<(Grade, Vec<Assignment>)>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let grade = sqlx::query_as::<_, Grade>(
        r#"
        UPDATE grades SET
            subject     = COALESCE($2, subject),
            semester    = COALESCE($3, semester),
            school_year = COALESCE($4, school_year),
            updated_at  = NOW()
        WHERE id = $1
        RETURNING id, student_id, class_id, subject, semester, school_year,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.subject)
    .bind(req.semester)
    .bind(req.school_year)
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let grade = match grade {
        Some(g) => g,
        None => return Ok(None),
    };

    let assignments = match req.assignments {
        Some(inputs) => {
            sqlx::query("DELETE FROM grade_assignments WHERE grade_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(SqlxErrorExt::into_app_error)?;
            insert_assignments(&mut tx, id, &inputs).await?
        }
        None => {
            sqlx::query_as::<_, Assignment>(
                r#"
                SELECT id, grade_id, name, score, max_score, weight, position
                FROM grade_assignments
                WHERE grade_id = $1
                ORDER BY position ASC
                "#,
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?
        }
    };

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    Ok(Some((grade, assignments)))
}

/// Delete a grade sheet. Its assignments go with it via the FK cascade.
/// Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM grades WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}

/// Grade statistics for a class. Final grades and bands are computed in
/// code with the same arithmetic the API responses use, so the numbers
/// always agree with what clients see per sheet.
pub async fn class_statistics(
    pool: &Pool<Postgres>,
    class_id: Uuid,
) -> Result<ClassStatistics, AppError> {
    let sheets = list_by_class(pool, class_id).await?;

    let mut distribution = GradeDistribution::default();
    let mut sum = 0.0;
    let mut graded_count: i64 = 0;

    for (_, assignments) in &sheets {
        if let Some(fg) = grading::final_grade(assignments) {
            distribution.record(GradeBand::classify(fg));
            sum += fg;
            graded_count += 1;
        }
    }

    let average_final_grade = if graded_count > 0 {
        Some(grading::round_off_2_decimals(sum / graded_count as f64))
    } else {
        None
    };

    Ok(ClassStatistics {
        class_id: class_id.to_string(),
        grade_count: sheets.len() as i64,
        graded_count,
        average_final_grade,
        distribution,
    })
}

/// Insert an assignment list for a grade sheet, positions following the
/// input order.
async fn insert_assignments(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    grade_id: Uuid,
    inputs: &[shared_types::AssignmentInput],
) -> Result<Vec<Assignment>, AppError> {
    let mut assignments = Vec::with_capacity(inputs.len());
    for (idx, input) in inputs.iter().enumerate() {
        let row = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO grade_assignments (grade_id, name, score, max_score, weight, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, grade_id, name, score, max_score, weight, position
            "#,
        )
        .bind(grade_id)
        .bind(&input.name)
        .bind(input.score)
        .bind(input.max_score)
        .bind(input.weight)
        .bind(idx as i32)
        .fetch_one(&mut **tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
        assignments.push(row);
    }
    Ok(assignments)
}

/// Fetch the assignments for a batch of grades in one query and pair
/// them up, preserving the grades' order.
async fn attach_assignments(
    pool: &Pool<Postgres>,
    grades: Vec<Grade>,
) -> Result<Vec<(Grade, Vec<Assignment>)>, AppError> {
    if grades.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = grades.iter().map(|g| g.id).collect();
    let rows = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, grade_id, name, score, max_score, weight, position
        FROM grade_assignments
        WHERE grade_id = ANY($1)
        ORDER BY position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let mut by_grade: HashMap<Uuid, Vec<Assignment>> = HashMap::new();
    for row in rows {
        by_grade.entry(row.grade_id).or_default().push(row);
    }

    Ok(grades
        .into_iter()
        .map(|g| {
            let assignments = by_grade.remove(&g.id).unwrap_or_default();
            (g, assignments)
        })
        .collect())
}
