use axum::Router;
use shared_types::{
    // Auth & user types
    AppError, AppErrorKind, AuthResponse, ChangePasswordRequest, DashboardStats, LoginRequest,
    MessageResponse, RefreshRequest, RegisterRequest, UpdateRoleRequest, UpdateUserRequest, User,
    UserRole,
    // Student types
    CreateStudentRequest, Student, StudentResponse, UpdateStudentRequest,
    // Teacher types
    CreateTeacherRequest, Teacher, TeacherResponse, UpdateTeacherRequest,
    // Class types
    Class, ClassResponse, ClassStatistics, CreateClassRequest, UpdateClassRequest,
    // Grade types
    Assignment, AssignmentInput, AssignmentResponse, CreateGradeRequest, Grade, GradeBand,
    GradeDistribution, GradeResponse, UpdateGradeRequest,
};
use sqlx::{Pool, Postgres};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        rest::auth::register,
        rest::auth::login,
        rest::auth::refresh,
        rest::auth::logout,
        rest::auth::me,
        rest::auth::change_password,
        // Users
        rest::user::list_users,
        rest::user::get_user,
        rest::user::update_user,
        rest::user::update_user_role,
        rest::user::delete_user,
        // Students
        rest::student::list_students,
        rest::student::search_students,
        rest::student::get_student,
        rest::student::get_student_by_mssv,
        rest::student::list_student_grades,
        rest::student::create_student,
        rest::student::update_student,
        rest::student::delete_student,
        // Teachers
        rest::teacher::list_teachers,
        rest::teacher::get_teacher,
        rest::teacher::list_teacher_classes,
        rest::teacher::create_teacher,
        rest::teacher::update_teacher,
        rest::teacher::delete_teacher,
        // Classes
        rest::class::list_classes,
        rest::class::get_class,
        rest::class::list_class_students,
        rest::class::class_statistics,
        rest::class::create_class,
        rest::class::update_class,
        rest::class::delete_class,
        // Grades
        rest::grade::list_grades,
        rest::grade::get_grade,
        rest::grade::create_grade,
        rest::grade::update_grade,
        rest::grade::delete_grade,
        // Dashboard
        rest::dashboard::get_dashboard_stats,
        health::health_check,
    ),
    components(schemas(
        // Auth & user schemas
        User, UserRole, DashboardStats, AppError, AppErrorKind,
        LoginRequest, RegisterRequest, RefreshRequest, AuthResponse,
        UpdateUserRequest, UpdateRoleRequest, ChangePasswordRequest, MessageResponse,
        // Student schemas
        Student, StudentResponse, CreateStudentRequest, UpdateStudentRequest,
        // Teacher schemas
        Teacher, TeacherResponse, CreateTeacherRequest, UpdateTeacherRequest,
        // Class schemas
        Class, ClassResponse, ClassStatistics, CreateClassRequest, UpdateClassRequest,
        // Grade schemas
        Grade, Assignment, AssignmentResponse, GradeResponse,
        AssignmentInput, CreateGradeRequest, UpdateGradeRequest,
        GradeBand, GradeDistribution,
        health::HealthResponse,
    )),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User account management endpoints"),
        (name = "students", description = "Student record management endpoints"),
        (name = "teachers", description = "Teacher management endpoints"),
        (name = "classes", description = "Class roster and statistics endpoints"),
        (name = "grades", description = "Grade sheet management endpoints"),
        (name = "dashboard", description = "Dashboard statistics"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Scholaris API",
        description = "Student Management System API",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`
/// and the REST API at `/api/*`.
pub fn api_router(pool: Pool<Postgres>) -> Router {
    let state = AppState { pool };

    Router::new()
        .merge(rest::rest_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
