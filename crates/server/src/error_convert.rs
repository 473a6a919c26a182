use shared_types::AppError;

/// Message for a 23505 unique violation, chosen off the constraint detail so
/// the client sees which field collided without parsing Postgres output.
fn unique_violation_message(detail: &str) -> &'static str {
    if detail.contains("mssv") {
        "A student with this MSSV already exists"
    } else if detail.contains("email") {
        "An account with this email already exists"
    } else if detail.contains("username") {
        "This username is already taken"
    } else if detail.contains("code") {
        "A class with this code already exists"
    } else {
        "A record with this value already exists"
    }
}

/// Map a sqlx error onto the API error space. Row-not-found becomes a 404,
/// unique violations a 409, everything else a 500.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(unique_violation_message(db_err.message()))
        }
        _ => AppError::database(err.to_string()),
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}
