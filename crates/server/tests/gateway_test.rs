use cove_server::ws::events::ServerEvent;
use cove_server::ws::gateway::GatewayState;
use tokio::sync::mpsc;

fn message_created(workspace_id: &str) -> ServerEvent {
    ServerEvent::MessageCreated {
        workspace_id: workspace_id.to_string(),
        message_id: "m1".to_string(),
        channel_id: Some("c1".to_string()),
        conversation_id: None,
        parent_message_id: None,
        member_id: "mem1".to_string(),
    }
}

#[tokio::test]
async fn broadcast_reaches_workspace_subscribers() {
    let gateway = GatewayState::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = gateway.next_client_id().await;
    gateway.register(client_id, "u1".into(), tx).await;
    gateway.subscribe_workspace(client_id, "w1").await;

    gateway
        .broadcast_workspace("w1", &message_created("w1"))
        .await;

    let msg = rx.try_recv().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
    assert_eq!(parsed["type"], "message_created");
    assert_eq!(parsed["workspaceId"], "w1");
    assert_eq!(parsed["channelId"], "c1");
    assert!(parsed.get("conversationId").is_none());
}

#[tokio::test]
async fn broadcast_skips_other_workspaces() {
    let gateway = GatewayState::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = gateway.next_client_id().await;
    gateway.register(client_id, "u1".into(), tx).await;
    gateway.subscribe_workspace(client_id, "w1").await;

    gateway
        .broadcast_workspace("w2", &message_created("w2"))
        .await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let gateway = GatewayState::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = gateway.next_client_id().await;
    gateway.register(client_id, "u1".into(), tx).await;
    gateway.subscribe_workspace(client_id, "w1").await;
    gateway.unsubscribe_workspace(client_id, "w1").await;

    gateway
        .broadcast_workspace("w1", &message_created("w1"))
        .await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unregister_cleans_up_subscriptions() {
    let gateway = GatewayState::new();

    let (tx, _rx) = mpsc::unbounded_channel();
    let client_id = gateway.next_client_id().await;
    gateway.register(client_id, "u1".into(), tx).await;
    gateway.subscribe_workspace(client_id, "w1").await;

    let client = gateway.unregister(client_id).await.unwrap();
    assert!(client.subscribed_workspaces.contains("w1"));

    assert!(gateway.workspace_subs.read().await.get("w1").is_none());
    assert!(gateway.clients.read().await.is_empty());
}

#[tokio::test]
async fn client_ids_are_unique() {
    let gateway = GatewayState::new();
    let a = gateway.next_client_id().await;
    let b = gateway.next_client_id().await;
    assert_ne!(a, b);
}
