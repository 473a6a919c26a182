use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::grading::GradeDistribution;

// ── Class DB struct ──────────────────────────────────────────────────

/// A class (cohort) of students.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    /// Unique class code (e.g. "CNTT-K19A").
    pub code: String,
    pub homeroom_teacher_id: Option<Uuid>,
    /// Academic year label (e.g. "2024-2025").
    pub academic_year: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Class API response ───────────────────────────────────────────────

/// API response shape for a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClassResponse {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeroom_teacher_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Class> for ClassResponse {
    fn from(c: Class) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            code: c.code,
            homeroom_teacher_id: c.homeroom_teacher_id.map(|id| id.to_string()),
            academic_year: c.academic_year,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

// ── Class statistics ─────────────────────────────────────────────────

/// Grade statistics for one class: band distribution plus the mean of the
/// computed final grades. Sheets without weighted assignments count toward
/// `grade_count` but not `graded_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClassStatistics {
    pub class_id: String,
    pub grade_count: i64,
    pub graded_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_final_grade: Option<f64>,
    pub distribution: GradeDistribution,
}

// ── Class request types ──────────────────────────────────────────────

/// Request to create a new class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateClassRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Class name is required"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Class code is required"))
    )]
    pub code: String,
    #[serde(default)]
    pub homeroom_teacher_id: Option<Uuid>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

/// Request to update a class (all fields optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateClassRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Class name is required"))
    )]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Class code is required"))
    )]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeroom_teacher_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
}
