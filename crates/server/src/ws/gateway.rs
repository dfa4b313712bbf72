use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};

use super::events::ServerEvent;

pub type ClientId = u64;

pub struct ConnectedClient {
    pub user_id: String,
    pub tx: mpsc::UnboundedSender<String>,
    pub subscribed_workspaces: HashSet<String>,
}

pub struct GatewayState {
    next_id: RwLock<u64>,
    pub clients: RwLock<HashMap<ClientId, ConnectedClient>>,
    pub workspace_subs: RwLock<HashMap<String, HashSet<ClientId>>>,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            next_id: RwLock::new(1),
            clients: RwLock::new(HashMap::new()),
            workspace_subs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn next_client_id(&self) -> ClientId {
        let mut id = self.next_id.write().await;
        let current = *id;
        *id += 1;
        current
    }

    pub async fn register(
        &self,
        client_id: ClientId,
        user_id: String,
        tx: mpsc::UnboundedSender<String>,
    ) {
        let client = ConnectedClient {
            user_id,
            tx,
            subscribed_workspaces: HashSet::new(),
        };
        self.clients.write().await.insert(client_id, client);
    }

    pub async fn unregister(&self, client_id: ClientId) -> Option<ConnectedClient> {
        let client = self.clients.write().await.remove(&client_id)?;

        let mut subs = self.workspace_subs.write().await;
        for workspace_id in &client.subscribed_workspaces {
            if let Some(set) = subs.get_mut(workspace_id) {
                set.remove(&client_id);
                if set.is_empty() {
                    subs.remove(workspace_id);
                }
            }
        }

        Some(client)
    }

    pub async fn subscribe_workspace(&self, client_id: ClientId, workspace_id: &str) {
        self.workspace_subs
            .write()
            .await
            .entry(workspace_id.to_string())
            .or_default()
            .insert(client_id);

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_workspaces.insert(workspace_id.to_string());
        }
    }

    pub async fn unsubscribe_workspace(&self, client_id: ClientId, workspace_id: &str) {
        let mut subs = self.workspace_subs.write().await;
        if let Some(set) = subs.get_mut(workspace_id) {
            set.remove(&client_id);
            if set.is_empty() {
                subs.remove(workspace_id);
            }
        }

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_workspaces.remove(workspace_id);
        }
    }

    pub async fn broadcast_workspace(&self, workspace_id: &str, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let subs = self.workspace_subs.read().await;
        let clients = self.clients.read().await;

        if let Some(subscriber_ids) = subs.get(workspace_id) {
            for &cid in subscriber_ids {
                if let Some(client) = clients.get(&cid) {
                    let _ = client.tx.send(msg.clone());
                }
            }
        }
    }
}
