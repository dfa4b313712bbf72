use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::member_of;
use crate::error::ApiError;
use crate::models::{AuthUser, Member, MemberWithUser, UserSummary};
use crate::AppState;

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub role: String,
}

/// GET /api/workspaces/:workspaceId/members — each member joined with its
/// user; rows whose user is gone are skipped rather than failing the list.
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let rows = sqlx::query_as::<_, Member>(
        "SELECT * FROM members WHERE workspace_id = ? ORDER BY created_at ASC",
    )
    .bind(&workspace_id)
    .fetch_all(&state.db)
    .await?;

    let mut result = Vec::with_capacity(rows.len());
    for member in rows {
        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, image FROM users WHERE id = ?",
        )
        .bind(&member.user_id)
        .fetch_optional(&state.db)
        .await?;

        if let Some(user) = user {
            result.push(MemberWithUser { member, user });
        }
    }

    Ok(Json(result))
}

/// GET /api/workspaces/:workspaceId/members/me
pub async fn current_member(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(workspace_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let member = member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::NotFound("Not a member of this workspace"))?;

    Ok(Json(member))
}

/// GET /api/members/:memberId — gated on the caller belonging to the same
/// workspace as the requested member.
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let member = fetch_member(&state, &member_id).await?;

    member_of(&state.db, &member.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let member_user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, image FROM users WHERE id = ?",
    )
    .bind(&member.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Member not found"))?;

    Ok(Json(MemberWithUser {
        member,
        user: member_user,
    }))
}

/// PATCH /api/members/:memberId — role change, admin only.
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(member_id): Path<String>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.role != "admin" && body.role != "member" {
        return Err(ApiError::BadRequest("Invalid role".into()));
    }

    let member = fetch_member(&state, &member_id).await?;

    let current = member_of(&state.db, &member.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;
    if current.role != "admin" {
        return Err(ApiError::Forbidden("Admin role required"));
    }

    sqlx::query("UPDATE members SET role = ? WHERE id = ?")
        .bind(&body.role)
        .bind(&member_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "id": member_id })))
}

/// DELETE /api/members/:memberId — removal cascades the member's messages,
/// reactions and conversations before the member row itself goes. Admins
/// are never removable.
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let member = fetch_member(&state, &member_id).await?;

    let current = member_of(&state.db, &member.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    if member.role == "admin" {
        return Err(ApiError::BadRequest("Admin cannot be removed".into()));
    }
    if current.id != member.id && current.role != "admin" {
        return Err(ApiError::Forbidden("Admin role required"));
    }

    sqlx::query("DELETE FROM messages WHERE member_id = ?")
        .bind(&member_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM reactions WHERE member_id = ?")
        .bind(&member_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM conversations WHERE member_one_id = ? OR member_two_id = ?")
        .bind(&member_id)
        .bind(&member_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(&member_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_member(state: &AppState, member_id: &str) -> Result<Member, ApiError> {
    sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Member not found"))
}
