use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::models::{Member, Message, UserSummary};

/// Read-time rollup of the thread under one root message. Recomputed on
/// every feed assembly; never persisted.
#[derive(Debug, Default)]
pub struct ThreadSummary {
    pub count: i64,
    pub image: Option<String>,
    pub timestamp: Option<i64>,
}

/// Summarize the direct replies of `message_id`.
///
/// Replies are fetched in explicit ascending creation-time order and the
/// last row is the latest reply (thread volume is bounded, so no
/// pagination). If the latest reply's author member or user cannot be
/// resolved, the whole summary zeroes out — the count does NOT fall back to
/// the known reply total.
pub async fn summarize_thread(
    db: &SqlitePool,
    message_id: &str,
) -> Result<ThreadSummary, ApiError> {
    let replies = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE parent_message_id = ? ORDER BY created_at ASC",
    )
    .bind(message_id)
    .fetch_all(db)
    .await?;

    let latest = match replies.last() {
        Some(latest) => latest,
        None => return Ok(ThreadSummary::default()),
    };

    let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(&latest.member_id)
        .fetch_optional(db)
        .await?;

    let member = match member {
        Some(member) => member,
        None => return Ok(ThreadSummary::default()),
    };

    let user = sqlx::query_as::<_, UserSummary>("SELECT id, name, image FROM users WHERE id = ?")
        .bind(&member.user_id)
        .fetch_optional(db)
        .await?;

    let user = match user {
        Some(user) => user,
        None => return Ok(ThreadSummary::default()),
    };

    Ok(ThreadSummary {
        count: replies.len() as i64,
        image: user.image,
        timestamp: Some(latest.created_at),
    })
}
