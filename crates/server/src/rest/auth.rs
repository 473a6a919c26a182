use axum::{extract::State, http::StatusCode, Json};
use shared_types::{
    AppError, AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
    RefreshRequest, RegisterRequest, User,
};
use sqlx::{Pool, Postgres};

use crate::auth::{extractors::AuthRequired, jwt, password as pw};
use crate::error_convert::{SqlxErrorExt, ValidateRequest};

/// User row including the stored password hash. Never leaves this module;
/// responses carry `User` instead.
#[derive(sqlx::FromRow)]
struct UserAuthRow {
    id: i64,
    username: String,
    display_name: String,
    email: String,
    role: String,
    password_hash: String,
}

impl UserAuthRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            display_name: self.display_name,
            email: self.email,
            role: self.role,
        }
    }
}

/// Issue an access/refresh token pair for a user and persist the hash of
/// the refresh token.
async fn issue_tokens(
    pool: &Pool<Postgres>,
    user: &User,
) -> Result<(String, String), AppError> {
    let access_token = jwt::create_access_token(user.id, &user.email, &user.role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let (refresh_token, expires_at) = jwt::create_refresh_token(user.id, &user.email, &user.role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    // Store the hash of the refresh token; never persist raw JWTs
    let refresh_hash = jwt::hash_token(&refresh_token);
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(refresh_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((access_token, refresh_token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 409, description = "Username or email already taken", body = AppError),
        (status = 422, description = "Validation error", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn register(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate_request()?;

    let password_hash =
        pw::hash_password(&payload.password).map_err(|e| AppError::internal(e.to_string()))?;

    let mut user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, display_name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, display_name, email, role
        "#,
    )
    .bind(&payload.username)
    .bind(&payload.display_name)
    .bind(&payload.email)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    user.role = crate::auth::maybe_promote_admin(&pool, user.id, &user.email, user.role).await;

    let (access_token, refresh_token) = issue_tokens(&pool, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            access_token,
            refresh_token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let row = sqlx::query_as::<_, UserAuthRow>(
        r#"
        SELECT id, username, display_name, email, role, password_hash
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    let valid = pw::verify_password(&payload.password, &row.password_hash)
        .map_err(|e| AppError::internal(e.to_string()))?;

    if !valid {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let mut user = row.into_user();
    user.role = crate::auth::maybe_promote_admin(&pool, user.id, &user.email, user.role).await;

    let (access_token, refresh_token) = issue_tokens(&pool, &user).await?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = AuthResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn refresh(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Only tokens with typ: "refresh" are accepted here
    let claims = jwt::validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

    // Look up by hash, not raw token; the DB stores SHA-256 hashes
    let token_hash = jwt::hash_token(&payload.refresh_token);
    let stored: Option<(i64, bool)> = sqlx::query_as(
        "SELECT id, revoked FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2",
    )
    .bind(&token_hash)
    .bind(claims.sub)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let (stored_id, revoked) =
        stored.ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;
    if revoked {
        return Err(AppError::unauthorized("Invalid refresh token"));
    }

    // Rotate: the presented token is single-use
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
        .bind(stored_id)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    // Re-read the account so role changes take effect on rotation
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, email, role FROM users WHERE id = $1",
    )
    .bind(claims.sub)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

    let (access_token, refresh_token) = issue_tokens(&pool, &user).await?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn logout(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<StatusCode, AppError> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
        .bind(auth.0.sub)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Account no longer exists", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn me(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, email, role FROM users WHERE id = $1",
    )
    .bind(auth.0.sub)
    .fetch_optional(&pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Not authenticated or wrong current password", body = AppError),
        (status = 422, description = "Validation error", body = AppError),
        (status = 500, description = "Internal server error", body = AppError)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(pool, auth, payload))]
pub async fn change_password(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate_request()?;

    let stored_hash: Option<(String,)> =
        sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
            .bind(auth.0.sub)
            .fetch_optional(&pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

    let (stored_hash,) = stored_hash.ok_or_else(|| AppError::not_found("User not found"))?;

    let valid = pw::verify_password(&payload.current_password, &stored_hash)
        .map_err(|e| AppError::internal(e.to_string()))?;

    if !valid {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    let new_hash =
        pw::hash_password(&payload.new_password).map_err(|e| AppError::internal(e.to_string()))?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(auth.0.sub)
        .bind(&new_hash)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    // Force re-authentication everywhere else
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
        .bind(auth.0.sub)
        .execute(&pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
