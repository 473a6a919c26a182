use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Discriminates access tokens from refresh tokens inside the `typ` claim,
/// so one can never stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier. Two tokens minted for the same user in the
    /// same second would otherwise hash identically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// "access" or "refresh".
    #[serde(default)]
    pub typ: String,
}

/// Hex-encoded SHA-256 of a raw JWT. The client holds the raw refresh token;
/// the database only ever sees this hash.
pub fn hash_token(raw_token: &str) -> String {
    format!("{:x}", Sha256::digest(raw_token.as_bytes()))
}

fn signing_secret() -> String {
    std::env::var("JWT_SECRET").expect("JWT_SECRET must be set")
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn access_token_expiry_minutes() -> i64 {
    env_i64("JWT_ACCESS_TOKEN_EXPIRY_MINUTES", 15)
}

pub fn refresh_token_expiry_days() -> i64 {
    env_i64("JWT_REFRESH_TOKEN_EXPIRY_DAYS", 7)
}

fn mint(
    user_id: i64,
    email: &str,
    role: &str,
    kind: TokenKind,
    lifetime: Duration,
) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + lifetime;
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Some(uuid::Uuid::new_v4().to_string()),
        typ: kind.as_str().to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(signing_secret().as_bytes()),
    )?;
    Ok((token, expires_at))
}

pub fn create_access_token(
    user_id: i64,
    email: &str,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let lifetime = Duration::minutes(access_token_expiry_minutes());
    mint(user_id, email, role, TokenKind::Access, lifetime).map(|(token, _)| token)
}

/// Returns the raw token together with its expiry, which the caller persists
/// alongside the token hash.
pub fn create_refresh_token(
    user_id: i64,
    email: &str,
    role: &str,
) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
    let lifetime = Duration::days(refresh_token_expiry_days());
    mint(user_id, email, role, TokenKind::Refresh, lifetime)
}

fn decode_claims(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(signing_secret().as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Validate an access token. A refresh token presented here is rejected even
/// though its signature verifies.
pub fn validate_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let claims = decode_claims(token)?;
    if claims.typ == TokenKind::Refresh.as_str() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}

/// Validate a refresh token. Requires `typ: "refresh"`, so access tokens
/// cannot drive the rotation endpoint.
pub fn validate_refresh_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let claims = decode_claims(token)?;
    if claims.typ != TokenKind::Refresh.as_str() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}
