use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env before reading any configuration.
    let _ = dotenvy::dotenv();

    init_tracing();

    server::health::record_start_time();

    let pool = server::db::create_pool();
    server::db::run_migrations(&pool).await;

    let rate_limit = server::rate_limit::RateLimitState::from_env();

    // Max request body size, default 2 MB. Configurable via MAX_UPLOAD_BYTES.
    let max_body: usize = std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2 * 1024 * 1024);

    let app = server::openapi::api_router(pool)
        .layer(axum::middleware::from_fn(
            server::auth::middleware::auth_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            server::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(build_cors_layer())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("Scholaris server listening on {}", addr);

    axum::serve(listener, app).await.expect("Server error");
}

/// Initialize tracing. LOG_FORMAT=json switches to machine-parseable output.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "server=info,tower_http=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Build CORS layer from the `CORS_ALLOWED_ORIGINS` environment variable.
///
/// - If "*": allows all origins (development only).
/// - If a comma-separated list: allows exactly those origins.
/// - If unset: defaults to localhost dev origins.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("CORS_ALLOWED_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: allowing ALL origins (CORS_ALLOWED_ORIGINS=*). Insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: no valid origins in CORS_ALLOWED_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                cors_with_origins(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: no CORS_ALLOWED_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Restrictive CORS layer that only allows localhost dev origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    cors_with_origins(origins)
}

fn cors_with_origins(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
