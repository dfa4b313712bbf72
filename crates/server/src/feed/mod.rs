//! Message-feed assembly: resolve the feed's partition key, pull one raw
//! page in reverse-chronological order, then join each row with its author,
//! aggregated reactions, thread summary and media URL.
//!
//! Everything here is read-only against the pool; the only mutation that
//! must agree with this module is message creation, which shares
//! [`resolve::resolve_conversation_id`] so replies and reads land on the
//! same partition.

mod assemble;
mod page;
mod reactions;
mod resolve;
mod thread;

pub use assemble::{assemble_message, EnrichedMessage};
pub use page::{fetch_raw_page, RawPage};
pub use reactions::{aggregate_reactions, ReactionGroup};
pub use resolve::resolve_conversation_id;
pub use thread::{summarize_thread, ThreadSummary};

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::ApiError;
use cove_shared::constants::{MAX_MESSAGE_PAGE_SIZE, MESSAGE_PAGE_SIZE};

/// Addressing + pagination parameters for one feed request. At least one of
/// the three addressing fields must be set; the caller is responsible for
/// membership gating before handing the query to [`get_feed`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<EnrichedMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

/// Retrieve one enriched page for the addressed feed.
///
/// Rows whose author chain is broken are dropped, never surfaced as errors;
/// the continuation cursor advances over the raw page so dropped rows can't
/// stall pagination.
pub async fn get_feed(db: &SqlitePool, query: &FeedQuery) -> Result<FeedPage, ApiError> {
    let conversation_id = resolve_conversation_id(
        db,
        query.channel_id.as_deref(),
        query.conversation_id.as_deref(),
        query.parent_message_id.as_deref(),
    )
    .await?;

    let limit = query
        .limit
        .unwrap_or(MESSAGE_PAGE_SIZE)
        .clamp(1, MAX_MESSAGE_PAGE_SIZE);

    let raw = fetch_raw_page(
        db,
        query.channel_id.as_deref(),
        query.parent_message_id.as_deref(),
        conversation_id.as_deref(),
        query.cursor,
        limit,
    )
    .await?;

    let mut items = Vec::with_capacity(raw.items.len());
    for message in &raw.items {
        if let Some(enriched) = assemble_message(db, message).await? {
            items.push(enriched);
        }
    }

    Ok(FeedPage {
        items,
        next_cursor: raw.next_cursor,
        has_more: raw.has_more,
    })
}
