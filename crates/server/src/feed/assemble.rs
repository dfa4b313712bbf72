use serde::Serialize;
use sqlx::SqlitePool;

use super::reactions::{aggregate_reactions, fetch_reactions, ReactionGroup};
use super::thread::summarize_thread;
use crate::error::ApiError;
use crate::models::{Attachment, Member, Message, UserSummary};

/// A raw message row joined with author, aggregated reactions, thread
/// summary, and resolved media URL — the feed's wire shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMessage {
    pub id: String,
    pub workspace_id: String,
    pub member_id: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub user: UserSummary,
    pub reactions: Vec<ReactionGroup>,
    pub thread_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_timestamp: Option<i64>,
}

/// Enrich one raw row. Returns `Ok(None)` when the author member or its
/// user no longer exists — the caller drops the row and carries on, it is
/// not an error. Store failures still propagate.
pub async fn assemble_message(
    db: &SqlitePool,
    message: &Message,
) -> Result<Option<EnrichedMessage>, ApiError> {
    let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(&message.member_id)
        .fetch_optional(db)
        .await?;

    let member = match member {
        Some(member) => member,
        None => return Ok(None),
    };

    let user = sqlx::query_as::<_, UserSummary>("SELECT id, name, image FROM users WHERE id = ?")
        .bind(&member.user_id)
        .fetch_optional(db)
        .await?;

    let user = match user {
        Some(user) => user,
        None => return Ok(None),
    };

    let raw_reactions = fetch_reactions(db, &message.id).await?;
    let reactions = aggregate_reactions(&raw_reactions);

    let thread = summarize_thread(db, &message.id).await?;

    let image = match &message.image {
        Some(attachment_id) => resolve_media_url(db, attachment_id).await?,
        None => None,
    };

    Ok(Some(EnrichedMessage {
        id: message.id.clone(),
        workspace_id: message.workspace_id.clone(),
        member_id: message.member_id.clone(),
        body: message.body.clone(),
        image,
        channel_id: message.channel_id.clone(),
        conversation_id: message.conversation_id.clone(),
        parent_message_id: message.parent_message_id.clone(),
        created_at: message.created_at,
        updated_at: message.updated_at,
        user,
        reactions,
        thread_count: thread.count,
        thread_image: thread.image,
        thread_timestamp: thread.timestamp,
    }))
}

/// Map a stored attachment id to the URL the file route serves it under.
/// A dangling reference resolves to absent, not an error.
pub async fn resolve_media_url(
    db: &SqlitePool,
    attachment_id: &str,
) -> Result<Option<String>, ApiError> {
    let attachment = sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = ?")
        .bind(attachment_id)
        .fetch_optional(db)
        .await?;

    Ok(attachment.map(|a| format!("/api/files/{}/{}", a.id, a.filename)))
}
