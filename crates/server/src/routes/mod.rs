pub mod auth;
pub mod channels;
pub mod conversations;
pub mod files;
pub mod members;
pub mod messages;
pub mod reactions;
pub mod users;
pub mod workspaces;

use crate::error::ApiError;
use crate::models::Member;
use crate::ws;
use crate::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/session", get(auth::get_session));

    let api_routes = Router::new()
        // Workspaces
        .route("/workspaces", post(workspaces::create_workspace))
        .route("/workspaces", get(workspaces::list_workspaces))
        .route("/workspaces/{workspaceId}", get(workspaces::get_workspace))
        .route("/workspaces/{workspaceId}", patch(workspaces::update_workspace))
        .route("/workspaces/{workspaceId}", delete(workspaces::delete_workspace))
        .route("/workspaces/{workspaceId}/join", post(workspaces::join_workspace))
        .route("/workspaces/{workspaceId}/join-code", post(workspaces::new_join_code))
        // Channels
        .route("/workspaces/{workspaceId}/channels", get(channels::list_channels))
        .route("/workspaces/{workspaceId}/channels", post(channels::create_channel))
        .route("/channels/{channelId}", get(channels::get_channel))
        .route("/channels/{channelId}", patch(channels::update_channel))
        .route("/channels/{channelId}", delete(channels::delete_channel))
        // Members
        .route("/workspaces/{workspaceId}/members", get(members::list_members))
        .route("/workspaces/{workspaceId}/members/me", get(members::current_member))
        .route("/members/{memberId}", get(members::get_member))
        .route("/members/{memberId}", patch(members::update_member))
        .route("/members/{memberId}", delete(members::remove_member))
        // Conversations
        .route("/conversations", post(conversations::create_or_get_conversation))
        // Messages (feed core)
        .route("/messages", get(messages::get_feed))
        .route("/messages", post(messages::create_message))
        .route("/messages/{messageId}", get(messages::get_message))
        .route("/messages/{messageId}", patch(messages::update_message))
        .route("/messages/{messageId}", delete(messages::delete_message))
        // Reactions
        .route("/messages/{messageId}/reactions", post(reactions::toggle_reaction))
        // Users
        .route("/users/me", get(users::get_me))
        // Files
        .route("/upload", post(files::upload))
        .route("/files/{id}/{filename}", get(files::serve_file));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .route("/gateway", get(ws::handler::ws_handler))
        .with_state(state)
}

/// Look up the caller's membership in a workspace. The feed's authorization
/// wrapper and every write path start here.
pub(crate) async fn member_of(
    db: &sqlx::SqlitePool,
    workspace_id: &str,
    user_id: &str,
) -> Result<Option<Member>, ApiError> {
    let member = sqlx::query_as::<_, Member>(
        "SELECT * FROM members WHERE workspace_id = ? AND user_id = ?",
    )
    .bind(workspace_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(member)
}
