use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::member_of;
use crate::db;
use crate::error::ApiError;
use crate::models::{AuthUser, Conversation, Member};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub workspace_id: String,
    pub member_id: String,
}

/// POST /api/conversations — create-or-get the 1:1 conversation between the
/// caller's member and the target member. The stored pair is unordered, so
/// the lookup checks both orderings.
pub async fn create_or_get_conversation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = member_of(&state.db, &body.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let other = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(&body.member_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Member not found"))?;

    if other.workspace_id != body.workspace_id {
        return Err(ApiError::NotFound("Member not found"));
    }

    let existing = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations
         WHERE workspace_id = ?
           AND ((member_one_id = ? AND member_two_id = ?)
             OR (member_one_id = ? AND member_two_id = ?))",
    )
    .bind(&body.workspace_id)
    .bind(&current.id)
    .bind(&other.id)
    .bind(&other.id)
    .bind(&current.id)
    .fetch_optional(&state.db)
    .await?;

    if let Some(conversation) = existing {
        return Ok(Json(conversation));
    }

    let conversation_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO conversations (id, workspace_id, member_one_id, member_two_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&conversation_id)
    .bind(&body.workspace_id)
    .bind(&current.id)
    .bind(&other.id)
    .bind(db::now_millis())
    .execute(&state.db)
    .await?;

    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE id = ?",
    )
    .bind(&conversation_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(conversation))
}
