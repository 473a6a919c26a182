pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;

/// The address configured to receive automatic admin rights, if any.
fn bootstrap_admin_email() -> Option<String> {
    std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty())
}

/// Promote the account to admin when its email matches `ADMIN_EMAIL`.
///
/// Called on register and login so the configured operator account holds
/// admin rights even on a fresh database. Returns the role to use for the
/// session; a failed UPDATE keeps the current role and is logged rather
/// than surfaced.
pub async fn maybe_promote_admin(
    db: &sqlx::PgPool,
    user_id: i64,
    email: &str,
    current_role: String,
) -> String {
    if current_role == "admin" {
        return current_role;
    }
    let is_bootstrap_admin = bootstrap_admin_email()
        .map(|admin| admin.eq_ignore_ascii_case(email))
        .unwrap_or(false);
    if !is_bootstrap_admin {
        return current_role;
    }

    let updated = sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await;
    match updated {
        Ok(_) => {
            tracing::info!(user_id, email, "promoted bootstrap admin account");
            "admin".to_string()
        }
        Err(e) => {
            tracing::error!(user_id, email, %e, "bootstrap admin promotion failed");
            current_role
        }
    }
}
