use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

// Type aliases for ids crossing the web boundary (web converts entity::Id to String)
pub type ChatId = String;
pub type UserId = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One open streaming connection: the chat it watches, the user that owns it,
/// and the channel its response body drains.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub sender: UnboundedSender<Result<Event, Infallible>>,
}

/// Connection registry with dual indices for O(1) lookups.
///
/// Chats are independent: routing to one chat's clients never takes a lock
/// covering another chat's set.
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: fast lookup by chat_id for event routing - O(1)
    chat_index: DashMap<ChatId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            chat_index: DashMap::new(),
        }
    }

    /// Register a new connection under its chat - O(1)
    pub fn register(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        sender: UnboundedSender<Result<Event, Infallible>>,
    ) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                chat_id: chat_id.clone(),
                user_id,
                sender,
            },
        );

        self.chat_index
            .entry(chat_id)
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    /// Unregister a connection - O(1). Safe to call more than once; a second
    /// call for the same id is a no-op.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            if let Some(mut entry) = self.chat_index.get_mut(&info.chat_id) {
                entry.remove(connection_id);

                // Clean up empty chat entries
                if entry.is_empty() {
                    drop(entry); // Release lock before removal
                    self.chat_index.remove(&info.chat_id);
                }
            }
        }
    }

    /// Number of live connections for a chat.
    pub fn chat_connection_count(&self, chat_id: &ChatId) -> usize {
        self.chat_index
            .get(chat_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Send an event to every connection registered for a chat.
    ///
    /// The id set is snapshotted before sending so clients may register or
    /// unregister mid-broadcast without blocking the write loop. A send
    /// failure means the receiving end is gone; that connection is
    /// unregistered and the remaining clients still get the event.
    pub fn send_to_chat(&self, chat_id: &ChatId, event: Event) {
        let connection_ids: Vec<ConnectionId> = match self.chat_index.get(chat_id) {
            Some(entry) => entry.iter().cloned().collect(),
            None => return,
        };

        let mut dead: Vec<ConnectionId> = Vec::new();
        for conn_id in &connection_ids {
            // Skip connections removed since the snapshot was taken
            if let Some(info) = self.connections.get(conn_id) {
                if info.sender.send(Ok(event.clone())).is_err() {
                    warn!(
                        "Failed to send event to connection {}; dropping it",
                        conn_id.as_str()
                    );
                    dead.push(conn_id.clone());
                }
            }
        }

        for conn_id in dead {
            self.unregister(&conn_id);
        }
    }

    /// Broadcast an event to all connections - O(n) (unavoidable, but explicit)
    pub fn broadcast(&self, event: Event) {
        let connection_ids: Vec<ConnectionId> =
            self.connections.iter().map(|entry| entry.key().clone()).collect();

        let mut dead: Vec<ConnectionId> = Vec::new();
        for conn_id in &connection_ids {
            if let Some(info) = self.connections.get(conn_id) {
                if info.sender.send(Ok(event.clone())).is_err() {
                    warn!(
                        "Failed to send broadcast to connection {}; dropping it",
                        conn_id.as_str()
                    );
                    dead.push(conn_id.clone());
                }
            }
        }

        for conn_id in dead {
            self.unregister(&conn_id);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
