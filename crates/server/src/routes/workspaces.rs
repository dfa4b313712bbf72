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
use crate::models::{AuthUser, Workspace, WorkspaceWithRole};
use crate::AppState;
use cove_shared::constants::JOIN_CODE_LENGTH;
use cove_shared::validation::validate_workspace_name;

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWorkspaceRequest {
    pub join_code: String,
}

fn generate_join_code() -> String {
    const ALPHABET: [char; 36] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
        'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];
    nanoid::nanoid!(JOIN_CODE_LENGTH, &ALPHABET)
}

/// POST /api/workspaces — creates the workspace, its creator's admin
/// membership, and a default `general` channel.
pub async fn create_workspace(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_workspace_name(&body.name).map_err(ApiError::BadRequest)?;

    let workspace_id = uuid::Uuid::new_v4().to_string();
    let join_code = generate_join_code();
    let now = db::now_millis();

    sqlx::query(
        "INSERT INTO workspaces (id, name, user_id, join_code, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&workspace_id)
    .bind(body.name.trim())
    .bind(&user.id)
    .bind(&join_code)
    .bind(now)
    .execute(&state.db)
    .await?;

    sqlx::query(
        "INSERT INTO members (id, user_id, workspace_id, role, created_at)
         VALUES (?, ?, ?, 'admin', ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user.id)
    .bind(&workspace_id)
    .bind(now)
    .execute(&state.db)
    .await?;

    sqlx::query(
        "INSERT INTO channels (id, workspace_id, name, created_at)
         VALUES (?, ?, 'general', ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&workspace_id)
    .bind(now)
    .execute(&state.db)
    .await?;

    let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = ?")
        .bind(&workspace_id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /api/workspaces — workspaces the caller belongs to, with role.
pub async fn list_workspaces(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let workspaces = sqlx::query_as::<_, WorkspaceWithRole>(
        "SELECT w.id, w.name, w.user_id, w.join_code, w.created_at, m.role
         FROM members m
         INNER JOIN workspaces w ON w.id = m.workspace_id
         WHERE m.user_id = ?
         ORDER BY w.created_at ASC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(workspaces))
}

/// GET /api/workspaces/:workspaceId
pub async fn get_workspace(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let member = member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = ?")
        .bind(&workspace_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Workspace not found"))?;

    Ok(Json(WorkspaceWithRole {
        id: workspace.id,
        name: workspace.name,
        user_id: workspace.user_id,
        join_code: workspace.join_code,
        created_at: workspace.created_at,
        role: member.role,
    }))
}

/// PATCH /api/workspaces/:workspaceId
pub async fn update_workspace(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
    Json(body): Json<UpdateWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &workspace_id, &user).await?;
    validate_workspace_name(&body.name).map_err(ApiError::BadRequest)?;

    sqlx::query("UPDATE workspaces SET name = ? WHERE id = ?")
        .bind(body.name.trim())
        .bind(&workspace_id)
        .execute(&state.db)
        .await?;

    let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = ?")
        .bind(&workspace_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Workspace not found"))?;

    Ok(Json(workspace))
}

/// DELETE /api/workspaces/:workspaceId — members, channels and
/// conversations cascade through foreign keys; messages and reactions are
/// removed explicitly since they carry loose references.
pub async fn delete_workspace(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &workspace_id, &user).await?;

    sqlx::query("DELETE FROM reactions WHERE workspace_id = ?")
        .bind(&workspace_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM messages WHERE workspace_id = ?")
        .bind(&workspace_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM workspaces WHERE id = ?")
        .bind(&workspace_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/workspaces/:workspaceId/join
pub async fn join_workspace(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
    Json(body): Json<JoinWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = ?")
        .bind(&workspace_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Workspace not found"))?;

    if workspace.join_code != body.join_code.trim().to_lowercase() {
        return Err(ApiError::BadRequest("Invalid join code".into()));
    }

    if member_of(&state.db, &workspace_id, &user.id).await?.is_some() {
        return Err(ApiError::Conflict("Already a member of this workspace"));
    }

    sqlx::query(
        "INSERT INTO members (id, user_id, workspace_id, role, created_at)
         VALUES (?, ?, ?, 'member', ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user.id)
    .bind(&workspace_id)
    .bind(db::now_millis())
    .execute(&state.db)
    .await?;

    Ok(Json(workspace))
}

/// POST /api/workspaces/:workspaceId/join-code — rotate the code.
pub async fn new_join_code(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &workspace_id, &user).await?;

    let join_code = generate_join_code();
    sqlx::query("UPDATE workspaces SET join_code = ? WHERE id = ?")
        .bind(&join_code)
        .bind(&workspace_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "joinCode": join_code })))
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
