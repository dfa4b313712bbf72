use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::member_of;
use crate::db;
use crate::error::ApiError;
use crate::models::{AuthUser, Channel};
use crate::AppState;
use cove_shared::validation::{normalize_channel_name, validate_channel_name};

#[derive(Deserialize)]
pub struct ChannelNameRequest {
    pub name: String,
}

/// GET /api/workspaces/:workspaceId/channels
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let channels = sqlx::query_as::<_, Channel>(
        "SELECT * FROM channels WHERE workspace_id = ? ORDER BY created_at ASC",
    )
    .bind(&workspace_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(channels))
}

/// POST /api/workspaces/:workspaceId/channels
pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
    Json(body): Json<ChannelNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;
    if member.role != "admin" {
        return Err(ApiError::Forbidden("Admin role required"));
    }

    let name = normalize_channel_name(&body.name);
    validate_channel_name(&name).map_err(ApiError::BadRequest)?;

    let channel_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO channels (id, workspace_id, name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&channel_id)
    .bind(&workspace_id)
    .bind(&name)
    .bind(db::now_millis())
    .execute(&state.db)
    .await?;

    let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(&channel_id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(channel)))
}

/// GET /api/channels/:channelId
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = fetch_channel(&state, &channel_id).await?;

    member_of(&state.db, &channel.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    Ok(Json(channel))
}

/// PATCH /api/channels/:channelId
pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<ChannelNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = fetch_channel(&state, &channel_id).await?;
    require_admin(&state, &channel.workspace_id, &user).await?;

    let name = normalize_channel_name(&body.name);
    validate_channel_name(&name).map_err(ApiError::BadRequest)?;

    sqlx::query("UPDATE channels SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&channel_id)
        .execute(&state.db)
        .await?;

    let channel = fetch_channel(&state, &channel_id).await?;
    Ok(Json(channel))
}

/// DELETE /api/channels/:channelId — the channel's messages go with it.
pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = fetch_channel(&state, &channel_id).await?;
    require_admin(&state, &channel.workspace_id, &user).await?;

    sqlx::query("DELETE FROM messages WHERE channel_id = ?")
        .bind(&channel_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM channels WHERE id = ?")
        .bind(&channel_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_channel(state: &AppState, channel_id: &str) -> Result<Channel, ApiError> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(channel_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Channel not found"))
}

async fn require_admin(
    state: &AppState,
    workspace_id: &str,
    user: &AuthUser,
) -> Result<(), ApiError> {
    let member = member_of(&state.db, workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;
    if member.role != "admin" {
        return Err(ApiError::Forbidden("Admin role required"));
    }
    Ok(())
}
