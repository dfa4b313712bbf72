use serde::{Deserialize, Serialize};

/// Client → server. Subscriptions are per-workspace; membership is checked
/// at subscribe time.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    SubscribeWorkspace {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
    },
    UnsubscribeWorkspace {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
    },
    Ping,
}

/// Server → client. Events carry ids only; the feed's derived joins stay
/// read-time, so consumers re-query instead of applying pushed state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    MessageCreated {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
        channel_id: Option<String>,
        #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        #[serde(rename = "parentMessageId", skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
        #[serde(rename = "memberId")]
        member_id: String,
    },
    MessageUpdated {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
    MessageDeleted {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
    ReactionToggled {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "memberId")]
        member_id: String,
        value: String,
    },
}
