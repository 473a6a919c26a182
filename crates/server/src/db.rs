use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

/// State shared by every Axum handler. `FromRef` lets handlers take
/// `State<Pool<Postgres>>` without naming the whole struct.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Pool<Postgres>,
}

/// Build the connection pool from `DATABASE_URL`.
///
/// The pool is lazy: nothing connects until the first query runs. Each
/// `#[tokio::test]` spins up its own runtime, and an eager connect here
/// would bind the pool to whichever runtime called first.
pub fn create_pool() -> Pool<Postgres> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&url)
        .expect("Failed to create database pool")
}

/// Apply pending migrations. Panics on failure; the server must not come up
/// against a half-migrated schema.
pub async fn run_migrations(pool: &Pool<Postgres>) {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .expect("Failed to run database migrations");
}
