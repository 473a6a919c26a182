use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared_types::{is_valid_role, AppError, UpdateRoleRequest, UpdateUserRequest, User, USER_ROLES};
use sqlx::{Pool, Postgres};

use crate::auth::extractors::{AuthRequired, RoleRequired, ADMIN};
use crate::error_convert::{SqlxErrorExt, ValidateRequest};

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "List of users", body = Vec<User>),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn list_users(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, email, role FROM users ORDER BY id ASC",
    )
    .fetch_all(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not your account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn get_user(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    if auth.0.sub != user_id && auth.0.role != "admin" {
        return Err(AppError::forbidden("You may only view your own account"));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, email, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("User with id {} not found", user_id)))?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Not your account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
        (status = 409, description = "Username or email already taken", body = AppError),
        (status = 422, description = "Validation error", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth, payload))]
pub async fn update_user(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    if auth.0.sub != user_id && auth.0.role != "admin" {
        return Err(AppError::forbidden("You may only update your own account"));
    }

    payload.validate_request()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            username     = COALESCE($2, username),
            display_name = COALESCE($3, display_name),
            email        = COALESCE($4, email),
            updated_at   = NOW()
        WHERE id = $1
        RETURNING id, username, display_name, email, role
        "#,
    )
    .bind(user_id)
    .bind(payload.username)
    .bind(payload.display_name)
    .bind(payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("User with id {} not found", user_id)))?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/role",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User not found", body = AppError),
        (status = 422, description = "Invalid role value", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn update_user_role(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, AppError> {
    let role = payload.role.to_lowercase();
    if !is_valid_role(&role) {
        return Err(AppError::validation(
            format!("Invalid role: {}. Valid values: {}", payload.role, USER_ROLES.join(", ")),
            Default::default(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET role = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, display_name, email, role
        "#,
    )
    .bind(user_id)
    .bind(&role)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("User with id {} not found", user_id)))?;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User not found", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn delete_user(
    State(pool): State<Pool<Postgres>>,
    _auth: RoleRequired<ADMIN>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    if result.rows_affected() > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!(
            "User with id {} not found",
            user_id
        )))
    }
}
