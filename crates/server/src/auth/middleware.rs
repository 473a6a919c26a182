use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::jwt::validate_access_token;

/// Permissive auth middleware.
///
/// Reads the `Authorization: Bearer <token>` header, validates the access
/// token and inserts `Claims` into request extensions for downstream
/// extractors. Does NOT reject unauthenticated or invalid requests;
/// handlers decide authorization through `AuthRequired` / `RoleRequired`.
///
/// Expired access tokens are simply treated as absent; clients obtain a
/// new pair through `POST /auth/refresh`.
pub async fn auth_middleware(mut req: Request, next: Next) -> Response {
    if let Some(token) = extract_bearer_token(&req) {
        if let Ok(claims) = validate_access_token(&token) {
            req.extensions_mut().insert(claims);
        }
    }

    next.run(req).await
}

/// Pull the raw token out of the `Authorization: Bearer <token>` header.
fn extract_bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
