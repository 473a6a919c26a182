use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    Router,
};
use serde_json::Value;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Global mutex ensuring tests run sequentially against the shared database.
/// Each test acquires this lock before truncating and seeding, preventing
/// concurrent tests from interfering with each other's data.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

/// Build a test router backed by a real Postgres pool.
/// Acquires a global lock, truncates all tables, and re-seeds the token user.
/// The returned `MutexGuard` must be held for the duration of the test to
/// prevent concurrent tests from truncating data.
pub async fn test_app() -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    // Acquire the global test lock, held until the test completes
    let guard = TEST_MUTEX.lock().await;

    let _ = dotenvy::dotenv();

    // Token helpers need a signing key even when no .env is present
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Truncate all data; identities restart so the user seeded below is
    // always id 1, matching the subject of create_test_token
    sqlx::query(
        "TRUNCATE grade_assignments, grades, students, classes, teachers, refresh_tokens, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate");

    // Seed a test user (takes id 1) for token-based auth tests. It never
    // logs in with a password, so the hash is a placeholder.
    sqlx::query(
        "INSERT INTO users (username, display_name, email, password_hash, role) VALUES ('testuser', 'Test User', 'test@test.com', 'unused', 'student')"
    )
    .execute(&pool)
    .await
    .expect("Failed to seed test user");

    let state = server::db::AppState { pool: pool.clone() };
    // Include the permissive auth middleware so AuthRequired extractors work
    // when a JWT Bearer token is present; unauthenticated requests still pass through.
    let router = server::rest::rest_router()
        .layer(middleware::from_fn(server::auth::middleware::auth_middleware))
        .with_state(state);

    (router, pool, guard)
}

/// Build a test router with a very tight rate limit for testing 429 responses.
pub async fn test_app_rate_limited(
    max_requests: u32,
) -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;
    let _ = dotenvy::dotenv();

    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE grade_assignments, grades, students, classes, teachers, refresh_tokens, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate");

    sqlx::query(
        "INSERT INTO users (username, display_name, email, password_hash, role) VALUES ('testuser', 'Test User', 'test@test.com', 'unused', 'student')"
    )
    .execute(&pool)
    .await
    .expect("Failed to seed test user");

    let rate_limit = server::rate_limit::RateLimitState::new(
        max_requests,
        std::time::Duration::from_secs(60),
    );
    let state = server::db::AppState { pool: pool.clone() };
    let router = server::rest::api_router_with_rate_limit(rate_limit)
        .layer(middleware::from_fn(server::auth::middleware::auth_middleware))
        .with_state(state);

    (router, pool, guard)
}

/// Create a JWT access token for the seeded test user (id 1) with a given
/// role ("student", "teacher" or "admin").
pub fn create_test_token(role: &str) -> String {
    server::auth::jwt::create_access_token(1, "test@test.com", role)
        .expect("Failed to create test JWT")
}

/// POST JSON to a route without authentication.
pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// GET a route without authentication.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// PUT JSON to a route without authentication.
pub async fn put_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// DELETE a route without authentication.
pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// POST JSON to a route with a JWT Bearer token.
pub async fn post_json_authed(
    app: &Router,
    uri: &str,
    body: &str,
    token: &str,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// GET a route with a JWT Bearer token.
pub async fn get_authed(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// PUT JSON to a route with a JWT Bearer token.
pub async fn put_json_authed(
    app: &Router,
    uri: &str,
    body: &str,
    token: &str,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// DELETE a route with a JWT Bearer token.
pub async fn delete_authed(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    send(app, req).await
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

/// Register a user via the API and return the auth response JSON
/// (user + access_token + refresh_token).
pub async fn register_test_user(
    app: &Router,
    username: &str,
    email: &str,
    password: &str,
) -> Value {
    let body = serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
        "display_name": "Test User",
    });

    let (status, response) =
        post_json(app, "/api/v1/auth/register", &body.to_string()).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to register test user: {} {:?}",
        status,
        response
    );
    response
}

/// Create a test teacher via the API (admin token) and return the response JSON.
pub async fn create_test_teacher(app: &Router, name: &str, email: &str) -> Value {
    let token = create_test_token("admin");
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "department": "Computer Science",
    });

    let (status, response) =
        post_json_authed(app, "/api/v1/teachers", &body.to_string(), &token).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create test teacher: {} {:?}",
        status,
        response
    );
    response
}

/// Create a test class via the API (admin token) and return the response JSON.
pub async fn create_test_class(app: &Router, name: &str, code: &str) -> Value {
    let token = create_test_token("admin");
    let body = serde_json::json!({
        "name": name,
        "code": code,
        "academic_year": "2024-2025",
    });

    let (status, response) =
        post_json_authed(app, "/api/v1/classes", &body.to_string(), &token).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create test class: {} {:?}",
        status,
        response
    );
    response
}

/// Create a test student via the API (teacher token) and return the response JSON.
pub async fn create_test_student(
    app: &Router,
    mssv: &str,
    name: &str,
    class_id: Option<&str>,
) -> Value {
    let token = create_test_token("teacher");
    let mut body = serde_json::json!({
        "mssv": mssv,
        "name": name,
    });
    if let Some(class_id) = class_id {
        body["class_id"] = Value::String(class_id.to_string());
    }

    let (status, response) =
        post_json_authed(app, "/api/v1/students", &body.to_string(), &token).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create test student: {} {:?}",
        status,
        response
    );
    response
}

/// Create a test grade sheet via the API (teacher token) and return the
/// response JSON. `assignments` is a JSON array of
/// `{name, score, max_score, weight}` objects.
pub async fn create_test_grade(
    app: &Router,
    student_id: &str,
    class_id: &str,
    subject: &str,
    assignments: Value,
) -> Value {
    let token = create_test_token("teacher");
    let body = serde_json::json!({
        "student_id": student_id,
        "class_id": class_id,
        "subject": subject,
        "assignments": assignments,
    });

    let (status, response) =
        post_json_authed(app, "/api/v1/grades", &body.to_string(), &token).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create test grade: {} {:?}",
        status,
        response
    );
    response
}
