use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::models::Message;

/// Normalize a feed address to its effective conversation id.
///
/// A supplied conversation id is used as-is. Otherwise, a reply addressed
/// only by parent message inherits the parent's stored conversation id
/// (which is itself null for a thread under a channel). A missing parent is
/// a structural `NotFound` and aborts the whole request.
///
/// Both the read path (feed retrieval) and the write path (reply creation)
/// go through this function, so the two always agree on the partition key.
pub async fn resolve_conversation_id(
    db: &SqlitePool,
    channel_id: Option<&str>,
    conversation_id: Option<&str>,
    parent_message_id: Option<&str>,
) -> Result<Option<String>, ApiError> {
    if let Some(conversation_id) = conversation_id {
        return Ok(Some(conversation_id.to_string()));
    }

    if channel_id.is_none() {
        if let Some(parent_id) = parent_message_id {
            let parent = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
                .bind(parent_id)
                .fetch_optional(db)
                .await?
                .ok_or(ApiError::NotFound("Parent message not found"))?;

            return Ok(parent.conversation_id);
        }
    }

    Ok(None)
}
