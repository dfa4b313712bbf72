#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use cove_server::{config::Config, db, routes, ws, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use argon2::PasswordHasher;

/// Create an in-memory SQLite pool with the schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    db::apply_schema(&pool).await.unwrap();

    pool
}

/// Build a test app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    let state = Arc::new(AppState {
        db: pool,
        config: Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: ":memory:".into(),
            upload_dir: "/tmp/cove-test-uploads".into(),
            max_upload_bytes: 1_048_576,
        },
        gateway: Arc::new(ws::gateway::GatewayState::new()),
    });

    routes::build_router(state)
}

pub fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

/// Create a user with an active session. Returns (user_id, session_token).
pub async fn create_test_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password: &str,
) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp_millis();

    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, image, created_at, updated_at)
         VALUES (?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(&user_id)
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    let token = uuid::Uuid::new_v4().to_string();
    let expires_at = now + 30 * 24 * 60 * 60 * 1000;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token, expires_at, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user_id)
    .bind(&token)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, token)
}

/// Set a user's avatar image URL.
pub async fn set_user_image(pool: &SqlitePool, user_id: &str, image: &str) {
    sqlx::query("UPDATE users SET image = ? WHERE id = ?")
        .bind(image)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Create a workspace with the given user as its admin member.
/// Returns (workspace_id, member_id).
pub async fn create_test_workspace(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
) -> (String, String) {
    let workspace_id = uuid::Uuid::new_v4().to_string();
    let member_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "INSERT INTO workspaces (id, name, user_id, join_code, created_at)
         VALUES (?, ?, ?, 'abc123', ?)",
    )
    .bind(&workspace_id)
    .bind(name)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO members (id, user_id, workspace_id, role, created_at)
         VALUES (?, ?, ?, 'admin', ?)",
    )
    .bind(&member_id)
    .bind(user_id)
    .bind(&workspace_id)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    (workspace_id, member_id)
}

/// Add a user to a workspace with the given role. Returns the member id.
pub async fn add_member(
    pool: &SqlitePool,
    workspace_id: &str,
    user_id: &str,
    role: &str,
) -> String {
    let member_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO members (id, user_id, workspace_id, role, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&member_id)
    .bind(user_id)
    .bind(workspace_id)
    .bind(role)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .unwrap();
    member_id
}

pub async fn create_channel(pool: &SqlitePool, workspace_id: &str, name: &str) -> String {
    let channel_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO channels (id, workspace_id, name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&channel_id)
    .bind(workspace_id)
    .bind(name)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .unwrap();
    channel_id
}

pub async fn create_conversation(
    pool: &SqlitePool,
    workspace_id: &str,
    member_one_id: &str,
    member_two_id: &str,
) -> String {
    let conversation_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO conversations (id, workspace_id, member_one_id, member_two_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&conversation_id)
    .bind(workspace_id)
    .bind(member_one_id)
    .bind(member_two_id)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .unwrap();
    conversation_id
}

/// Insert a message row with an explicit creation time so tests control
/// feed ordering deterministically.
pub struct MessageRow<'a> {
    pub workspace_id: &'a str,
    pub member_id: &'a str,
    pub body: &'a str,
    pub channel_id: Option<&'a str>,
    pub conversation_id: Option<&'a str>,
    pub parent_message_id: Option<&'a str>,
    pub created_at: i64,
}

pub async fn insert_message(pool: &SqlitePool, row: MessageRow<'_>) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO messages
           (id, workspace_id, member_id, body, image, channel_id, conversation_id,
            parent_message_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?, NULL)",
    )
    .bind(&id)
    .bind(row.workspace_id)
    .bind(row.member_id)
    .bind(row.body)
    .bind(row.channel_id)
    .bind(row.conversation_id)
    .bind(row.parent_message_id)
    .bind(row.created_at)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Insert a raw reaction row directly, bypassing toggle semantics — used to
/// manufacture the duplicate-row states the aggregator must collapse.
/// Creation times come from a monotonic counter so retrieval order is
/// deterministic even within one millisecond.
pub async fn insert_reaction(
    pool: &SqlitePool,
    workspace_id: &str,
    message_id: &str,
    member_id: &str,
    value: &str,
) -> String {
    static SEQ: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(1);
    let created_at = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO reactions (id, workspace_id, message_id, member_id, value, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(workspace_id)
    .bind(message_id)
    .bind(member_id)
    .bind(value)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub async fn create_attachment(
    pool: &SqlitePool,
    uploader_id: &str,
    filename: &str,
    content_type: &str,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO attachments (id, uploader_id, filename, content_type, size, created_at)
         VALUES (?, ?, ?, ?, 1024, ?)",
    )
    .bind(&id)
    .bind(uploader_id)
    .bind(filename)
    .bind(content_type)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .unwrap();
    id
}
