use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::member_of;
use crate::db;
use crate::error::ApiError;
use crate::models::{AuthUser, Message, Reaction};
use crate::ws::events::ServerEvent;
use crate::AppState;
use cove_shared::validation::validate_reaction_value;

#[derive(Deserialize)]
pub struct ToggleReactionRequest {
    pub value: String,
}

/// POST /api/messages/:messageId/reactions — toggle keyed on
/// (message, member, value): removes the existing row if present, inserts
/// otherwise. This is what keeps (message, member, value) unique without a
/// stored constraint.
pub async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(body): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_reaction_value(&body.value).map_err(ApiError::BadRequest)?;

    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(&message_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Message not found"))?;

    let member = member_of(&state.db, &message.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let existing = sqlx::query_as::<_, Reaction>(
        "SELECT * FROM reactions WHERE message_id = ? AND member_id = ? AND value = ?",
    )
    .bind(&message_id)
    .bind(&member.id)
    .bind(&body.value)
    .fetch_optional(&state.db)
    .await?;

    let reaction_id = match existing {
        Some(reaction) => {
            sqlx::query("DELETE FROM reactions WHERE id = ?")
                .bind(&reaction.id)
                .execute(&state.db)
                .await?;
            reaction.id
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO reactions (id, workspace_id, message_id, member_id, value, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&message.workspace_id)
            .bind(&message_id)
            .bind(&member.id)
            .bind(&body.value)
            .bind(db::now_millis())
            .execute(&state.db)
            .await?;
            id
        }
    };

    state
        .gateway
        .broadcast_workspace(
            &message.workspace_id,
            &ServerEvent::ReactionToggled {
                workspace_id: message.workspace_id.clone(),
                message_id: message_id.clone(),
                member_id: member.id.clone(),
                value: body.value.clone(),
            },
        )
        .await;

    Ok(Json(serde_json::json!({ "id": reaction_id })))
}
