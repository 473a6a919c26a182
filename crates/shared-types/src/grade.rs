use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::grading::{self, GradeBand};

// ── Grade DB struct ──────────────────────────────────────────────────

/// A grade sheet: one student's scores for a subject within a class,
/// optionally scoped to a semester and school year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub subject: String,
    pub semester: Option<String>,
    pub school_year: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Assignment DB struct ─────────────────────────────────────────────

/// A scored assignment belonging to a grade sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Assignment {
    pub id: Uuid,
    pub grade_id: Uuid,
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
    /// Preserves the order the client submitted the list in.
    pub position: i32,
}

// ── Grade API responses ──────────────────────────────────────────────

/// API response shape for a single assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignmentResponse {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

impl From<Assignment> for AssignmentResponse {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id.to_string(),
            name: a.name,
            score: a.score,
            max_score: a.max_score,
            weight: a.weight,
        }
    }
}

/// API response shape for a grade sheet, embedding its assignment list and
/// the derived weighted final grade + classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GradeResponse {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_year: Option<String>,
    pub assignments: Vec<AssignmentResponse>,
    /// Weighted final grade on the 0–10 scale, rounded to 2 decimals.
    /// Absent when the assignment list carries no weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<GradeBand>,
    pub created_at: String,
    pub updated_at: String,
}

impl GradeResponse {
    /// Assemble a response from a grade row and its assignment rows.
    /// Classification uses the unrounded final grade.
    pub fn from_parts(grade: Grade, assignments: Vec<Assignment>) -> Self {
        let final_grade = grading::final_grade(&assignments);
        let classification = final_grade.map(GradeBand::classify);
        Self {
            id: grade.id.to_string(),
            student_id: grade.student_id.to_string(),
            class_id: grade.class_id.to_string(),
            subject: grade.subject,
            semester: grade.semester,
            school_year: grade.school_year,
            assignments: assignments.into_iter().map(AssignmentResponse::from).collect(),
            final_grade: final_grade.map(grading::round_off_2_decimals),
            classification,
            created_at: grade.created_at.to_rfc3339(),
            updated_at: grade.updated_at.to_rfc3339(),
        }
    }
}

// ── Grade request types ──────────────────────────────────────────────

/// A single assignment in a create/update payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct AssignmentInput {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Assignment name is required"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0.0, message = "Score must be non-negative"))
    )]
    pub score: f64,
    #[cfg_attr(
        feature = "validation",
        validate(range(exclusive_min = 0.0, message = "Max score must be positive"))
    )]
    pub max_score: f64,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0.0, message = "Weight must be non-negative"))
    )]
    pub weight: f64,
}

/// Request to create a new grade sheet with its assignment list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateGradeRequest {
    pub student_id: Uuid,
    pub class_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Subject is required"))
    )]
    pub subject: String,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub school_year: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", validate(nested))]
    pub assignments: Vec<AssignmentInput>,
}

/// Request to update a grade sheet (all fields optional). When
/// `assignments` is present the stored list is replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateGradeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Subject is required"))
    )]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", validate(nested))]
    pub assignments: Option<Vec<AssignmentInput>>,
}
