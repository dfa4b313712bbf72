use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::member_of;
use crate::db;
use crate::error::ApiError;
use crate::feed::{self, assemble_message, resolve_conversation_id, FeedQuery};
use crate::models::{AuthUser, Channel, Conversation, Message};
use crate::ws::events::ServerEvent;
use crate::AppState;
use cove_shared::validation::validate_message_body;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub body: String,
    pub image: Option<String>,
    pub workspace_id: String,
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMessageRequest {
    pub body: String,
}

/// GET /api/messages — the feed endpoint. Addressing params are resolved
/// to a workspace purely for the membership gate; everything after that is
/// the feed core's job.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace_id = workspace_for_feed(&state, &query).await?;

    member_of(&state.db, &workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let page = feed::get_feed(&state.db, &query).await?;

    Ok(Json(page))
}

/// GET /api/messages/:messageId — a single enriched message.
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let message = fetch_message(&state, &message_id).await?;

    member_of(&state.db, &message.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    let enriched = assemble_message(&state.db, &message)
        .await?
        .ok_or(ApiError::NotFound("Message not found"))?;

    Ok(Json(enriched))
}

/// POST /api/messages — create a top-level message or a reply. A reply
/// addressed only by its parent inherits the parent's conversation id
/// through the same resolver the read path uses.
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = member_of(&state.db, &body.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    validate_message_body(&body.body).map_err(ApiError::BadRequest)?;

    let conversation_id = resolve_conversation_id(
        &state.db,
        body.channel_id.as_deref(),
        body.conversation_id.as_deref(),
        body.parent_message_id.as_deref(),
    )
    .await?;

    let message_id = uuid::Uuid::new_v4().to_string();
    let now = db::now_millis();

    // updated_at stays NULL until the first edit.
    sqlx::query(
        "INSERT INTO messages
           (id, workspace_id, member_id, body, image, channel_id, conversation_id,
            parent_message_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(&message_id)
    .bind(&body.workspace_id)
    .bind(&member.id)
    .bind(&body.body)
    .bind(&body.image)
    .bind(&body.channel_id)
    .bind(&conversation_id)
    .bind(&body.parent_message_id)
    .bind(now)
    .execute(&state.db)
    .await?;

    state
        .gateway
        .broadcast_workspace(
            &body.workspace_id,
            &ServerEvent::MessageCreated {
                workspace_id: body.workspace_id.clone(),
                message_id: message_id.clone(),
                channel_id: body.channel_id.clone(),
                conversation_id: conversation_id.clone(),
                parent_message_id: body.parent_message_id.clone(),
                member_id: member.id.clone(),
            },
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": message_id })),
    ))
}

/// PATCH /api/messages/:messageId — author-only body edit.
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = fetch_message(&state, &message_id).await?;
    require_author(&state, &message, &user).await?;

    validate_message_body(&body.body).map_err(ApiError::BadRequest)?;

    sqlx::query("UPDATE messages SET body = ?, updated_at = ? WHERE id = ?")
        .bind(&body.body)
        .bind(db::now_millis())
        .bind(&message_id)
        .execute(&state.db)
        .await?;

    state
        .gateway
        .broadcast_workspace(
            &message.workspace_id,
            &ServerEvent::MessageUpdated {
                workspace_id: message.workspace_id.clone(),
                message_id: message_id.clone(),
            },
        )
        .await;

    Ok(Json(serde_json::json!({ "id": message_id })))
}

/// DELETE /api/messages/:messageId — author-only hard delete; the
/// message's reactions cascade.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let message = fetch_message(&state, &message_id).await?;
    require_author(&state, &message, &user).await?;

    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(&message_id)
        .execute(&state.db)
        .await?;

    state
        .gateway
        .broadcast_workspace(
            &message.workspace_id,
            &ServerEvent::MessageDeleted {
                workspace_id: message.workspace_id.clone(),
                message_id: message_id.clone(),
            },
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the feed's addressing params to the workspace that gates it:
/// channel first, then conversation, then parent message.
async fn workspace_for_feed(state: &AppState, query: &FeedQuery) -> Result<String, ApiError> {
    if let Some(channel_id) = &query.channel_id {
        let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
            .bind(channel_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(ApiError::NotFound("Channel not found"))?;
        return Ok(channel.workspace_id);
    }

    if let Some(conversation_id) = &query.conversation_id {
        let conversation =
            sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ?")
                .bind(conversation_id)
                .fetch_optional(&state.db)
                .await?
                .ok_or(ApiError::NotFound("Conversation not found"))?;
        return Ok(conversation.workspace_id);
    }

    if let Some(parent_message_id) = &query.parent_message_id {
        let parent = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(parent_message_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(ApiError::NotFound("Parent message not found"))?;
        return Ok(parent.workspace_id);
    }

    Err(ApiError::BadRequest(
        "Channel, conversation, or parent message required".into(),
    ))
}

async fn fetch_message(state: &AppState, message_id: &str) -> Result<Message, ApiError> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Message not found"))
}

async fn require_author(
    state: &AppState,
    message: &Message,
    user: &AuthUser,
) -> Result<(), ApiError> {
    let member = member_of(&state.db, &message.workspace_id, &user.id)
        .await?
        .ok_or(ApiError::Forbidden("Not a member of this workspace"))?;

    if member.id != message.member_id {
        return Err(ApiError::Forbidden("Not the message author"));
    }
    Ok(())
}
