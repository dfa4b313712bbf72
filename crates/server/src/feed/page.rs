use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::models::Message;

/// One raw page of message rows, newest first, plus continuation state.
#[derive(Debug)]
pub struct RawPage {
    pub items: Vec<Message>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

/// Fetch one page for the partition key
/// `(channel_id, parent_message_id, conversation_id)`, strictly descending
/// by creation time. `IS ?` keeps the null components of the key null-safe.
///
/// Overfetches by one row to decide `has_more`. The continuation cursor is
/// the creation time of the last RAW row of the page, so rows later dropped
/// during enrichment still advance the cursor. Concurrent inserts above the
/// cursor stay invisible to continuation calls; the cursor only ever moves
/// backward in time.
pub async fn fetch_raw_page(
    db: &SqlitePool,
    channel_id: Option<&str>,
    parent_message_id: Option<&str>,
    conversation_id: Option<&str>,
    cursor: Option<i64>,
    limit: i64,
) -> Result<RawPage, ApiError> {
    let mut items = if let Some(cursor) = cursor {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE channel_id IS ? AND parent_message_id IS ? AND conversation_id IS ?
               AND created_at < ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(channel_id)
        .bind(parent_message_id)
        .bind(conversation_id)
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(db)
        .await?
    } else {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE channel_id IS ? AND parent_message_id IS ? AND conversation_id IS ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(channel_id)
        .bind(parent_message_id)
        .bind(conversation_id)
        .bind(limit + 1)
        .fetch_all(db)
        .await?
    };

    let has_more = items.len() as i64 > limit;
    if has_more {
        items.pop();
    }

    let next_cursor = if has_more {
        items.last().map(|m| m.created_at)
    } else {
        None
    };

    Ok(RawPage {
        items,
        next_cursor,
        has_more,
    })
}
