use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use argon2::{PasswordHasher, PasswordVerifier};

use crate::db;
use crate::error::ApiError;
use crate::middleware::auth::{resolve_session, SESSION_COOKIE};
use crate::models::{SessionResponse, SignInRequest, SignUpRequest, UserSummary};
use crate::AppState;
use cove_shared::constants::{MIN_PASSWORD_LENGTH, SESSION_TTL_DAYS};

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=None; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

async fn create_session(db: &sqlx::SqlitePool, user_id: &str) -> Result<String, ApiError> {
    let token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = db::now_millis();
    let expires_at = now + SESSION_TTL_DAYS * 24 * 60 * 60 * 1000;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token, expires_at, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(&token)
    .bind(expires_at)
    .bind(now)
    .execute(db)
    .await?;

    Ok(token)
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    let name = body.name.trim().to_string();

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;

    if exists > 0 {
        return Err(ApiError::Conflict("Email already registered"));
    }

    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = argon2::Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|_| ApiError::BadRequest("Failed to hash password".into()))?
        .to_string();

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = db::now_millis();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, image, created_at, updated_at)
         VALUES (?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(&user_id)
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(&state.db)
    .await?;

    let token = create_session(&state.db, &user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        "set-cookie",
        session_cookie(&token, SESSION_TTL_DAYS * 24 * 60 * 60)
            .parse()
            .unwrap(),
    );

    let body = SessionResponse {
        user: UserSummary {
            id: user_id,
            name,
            image: None,
        },
        token,
    };

    Ok((StatusCode::OK, headers, Json(body)))
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, (String, String, Option<String>, String)>(
        "SELECT id, name, image, password_hash FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::Unauthorized)?;

    let (user_id, name, image, stored_hash) = user;

    let parsed_hash =
        argon2::PasswordHash::new(&stored_hash).map_err(|_| ApiError::Unauthorized)?;

    if argon2::Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::Unauthorized);
    }

    let token = create_session(&state.db, &user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        "set-cookie",
        session_cookie(&token, SESSION_TTL_DAYS * 24 * 60 * 60)
            .parse()
            .unwrap(),
    );

    let body = SessionResponse {
        user: UserSummary {
            id: user_id,
            name,
            image,
        },
        token,
    };

    Ok((StatusCode::OK, headers, Json(body)))
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = token_from_headers(&headers) {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&token)
            .execute(&state.db)
            .await?;
    }

    let mut resp_headers = HeaderMap::new();
    resp_headers.insert("set-cookie", session_cookie("", 0).parse().unwrap());

    Ok((StatusCode::OK, resp_headers, Json(serde_json::json!({}))))
}

/// GET /api/auth/session — current user, or JSON null when the token is
/// missing, unknown or expired.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = match token_from_headers(&headers) {
        Some(t) => t,
        None => return Ok(Json(serde_json::json!(null))),
    };

    match resolve_session(&state.db, &token).await? {
        Some(auth) => {
            let user = sqlx::query_as::<_, UserSummary>(
                "SELECT id, name, image FROM users WHERE id = ?",
            )
            .bind(&auth.id)
            .fetch_optional(&state.db)
            .await?;

            match user {
                Some(user) => Ok(Json(serde_json::json!({ "user": user }))),
                None => Ok(Json(serde_json::json!(null))),
            }
        }
        None => Ok(Json(serde_json::json!(null))),
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let from_cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            let c = c.trim();
            c.strip_prefix(&format!("{}=", SESSION_COOKIE))
                .map(|t| t.to_string())
        })
        .next();

    from_header.or(from_cookie).filter(|t| !t.is_empty())
}
