mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::MessageRow;

async fn setup_with_message() -> (TestServer, sqlx::SqlitePool, String, String, String, String, String) {
    let pool = common::setup_test_db().await;
    let server = TestServer::new(common::create_test_app(pool.clone())).unwrap();

    let (user_id, token) = common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;
    let (workspace_id, member_id) = common::create_test_workspace(&pool, &user_id, "Acme").await;
    let channel_id = common::create_channel(&pool, &workspace_id, "general").await;

    let message_id = common::insert_message(
        &pool,
        MessageRow {
            workspace_id: &workspace_id,
            member_id: &member_id,
            body: "react to me",
            channel_id: Some(&channel_id),
            conversation_id: None,
            parent_message_id: None,
            created_at: 1_000,
        },
    )
    .await;

    (server, pool, token, workspace_id, member_id, channel_id, message_id)
}

async fn feed_reactions(
    server: &TestServer,
    token: &str,
    channel_id: &str,
) -> serde_json::Value {
    let (h, v) = common::auth_header(token);
    let res = server
        .get(&format!("/api/messages?channelId={}", channel_id))
        .add_header(h, v)
        .await;
    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    body["items"][0]["reactions"].clone()
}

#[tokio::test]
async fn toggle_adds_then_removes() {
    let (server, _pool, token, _workspace_id, member_id, channel_id, message_id) =
        setup_with_message().await;

    let (h, v) = common::auth_header(&token);
    let res = server
        .post(&format!("/api/messages/{}/reactions", message_id))
        .add_header(h.clone(), v.clone())
        .json(&serde_json::json!({"value": "👍"}))
        .await;
    res.assert_status_ok();

    let reactions = feed_reactions(&server, &token, &channel_id).await;
    assert_eq!(reactions.as_array().unwrap().len(), 1);
    assert_eq!(reactions[0]["value"], "👍");
    assert_eq!(reactions[0]["count"], 1);
    assert_eq!(reactions[0]["memberIds"][0], member_id);

    // Same (message, member, value) again: the pair is idempotent
    let res = server
        .post(&format!("/api/messages/{}/reactions", message_id))
        .add_header(h, v)
        .json(&serde_json::json!({"value": "👍"}))
        .await;
    res.assert_status_ok();

    let reactions = feed_reactions(&server, &token, &channel_id).await;
    assert_eq!(reactions.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn counts_are_per_distinct_member_not_per_row() {
    let (server, pool, token, workspace_id, member_id, channel_id, message_id) =
        setup_with_message().await;

    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob", "pass12345").await;
    let bob_member = common::add_member(&pool, &workspace_id, &bob_id, "member").await;

    // Two raw rows from alice (duplicate state a toggle race can leave
    // behind) and one from bob
    common::insert_reaction(&pool, &workspace_id, &message_id, &member_id, "👍").await;
    common::insert_reaction(&pool, &workspace_id, &message_id, &member_id, "👍").await;
    common::insert_reaction(&pool, &workspace_id, &message_id, &bob_member, "👍").await;

    let reactions = feed_reactions(&server, &token, &channel_id).await;
    assert_eq!(reactions.as_array().unwrap().len(), 1);
    assert_eq!(reactions[0]["count"], 2);

    let member_ids: Vec<&str> = reactions[0]["memberIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap())
        .collect();
    assert_eq!(member_ids, vec![member_id.as_str(), bob_member.as_str()]);
}

#[tokio::test]
async fn groups_appear_in_first_seen_order() {
    let (server, pool, token, workspace_id, member_id, channel_id, message_id) =
        setup_with_message().await;

    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob", "pass12345").await;
    let bob_member = common::add_member(&pool, &workspace_id, &bob_id, "member").await;

    common::insert_reaction(&pool, &workspace_id, &message_id, &member_id, "🎉").await;
    common::insert_reaction(&pool, &workspace_id, &message_id, &bob_member, "👍").await;
    common::insert_reaction(&pool, &workspace_id, &message_id, &bob_member, "🎉").await;

    let reactions = feed_reactions(&server, &token, &channel_id).await;
    let values: Vec<&str> = reactions
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["🎉", "👍"]);
    assert_eq!(reactions[0]["count"], 2);
    assert_eq!(reactions[1]["count"], 1);
}

#[tokio::test]
async fn toggle_unknown_message_is_not_found() {
    let (server, _pool, token, _workspace_id, _member_id, _channel_id, _message_id) =
        setup_with_message().await;

    let (h, v) = common::auth_header(&token);
    let res = server
        .post("/api/messages/missing/reactions")
        .add_header(h, v)
        .json(&serde_json::json!({"value": "👍"}))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_requires_workspace_membership() {
    let (server, pool, _token, _workspace_id, _member_id, _channel_id, message_id) =
        setup_with_message().await;

    let (_, outsider_token) =
        common::create_test_user(&pool, "outsider@test.com", "outsider", "pass12345").await;

    let (h, v) = common::auth_header(&outsider_token);
    let res = server
        .post(&format!("/api/messages/{}/reactions", message_id))
        .add_header(h, v)
        .json(&serde_json::json!({"value": "👍"}))
        .await;

    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reactions_are_stripped_of_per_instance_fields() {
    let (server, pool, token, workspace_id, member_id, channel_id, message_id) =
        setup_with_message().await;

    common::insert_reaction(&pool, &workspace_id, &message_id, &member_id, "👍").await;

    let reactions = feed_reactions(&server, &token, &channel_id).await;
    let group = reactions[0].as_object().unwrap();
    // Only the aggregated shape: no raw reaction id or memberId leaks out
    assert_eq!(group.len(), 3);
    assert!(group.contains_key("value"));
    assert!(group.contains_key("count"));
    assert!(group.contains_key("memberIds"));
}
