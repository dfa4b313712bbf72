use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::db;
use crate::error::ApiError;
use crate::models::AuthUser;
use crate::AppState;

pub const SESSION_COOKIE: &str = "cove.session_token";

/// Pull the session token out of the Authorization header or the session
/// cookie, header winning.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let from_cookie = CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string());

    from_header.or(from_cookie).filter(|t| !t.is_empty())
}

/// Resolve a session token to its user, rejecting expired sessions.
pub async fn resolve_session(
    db: &sqlx::SqlitePool,
    token: &str,
) -> Result<Option<AuthUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT u.id, u.name, s.expires_at
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token = ?",
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    Ok(match row {
        Some((id, name, expires_at)) if expires_at > db::now_millis() => {
            Some(AuthUser { id, name })
        }
        _ => None,
    })
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(ApiError::Unauthorized)?;

        resolve_session(&state.db, &token)
            .await?
            .ok_or(ApiError::Unauthorized)
    }
}
