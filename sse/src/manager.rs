use crate::connection::{ChatId, ConnectionId, ConnectionRegistry, UserId};
use crate::message::{EventType, Message as SseMessage, MessageScope};
use axum::response::sse::Event;
use log::*;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection for a chat and return its unique ID
    pub fn register_connection(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        sender: tokio::sync::mpsc::UnboundedSender<Result<Event, std::convert::Infallible>>,
    ) -> ConnectionId {
        let connection_id = self.registry.register(chat_id, user_id, sender);
        info!("Registered new SSE connection");
        connection_id
    }

    /// Unregister a connection by ID
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        info!("Unregistering SSE connection");
        self.registry.unregister(connection_id);
    }

    /// Number of live connections for a chat.
    pub fn chat_connection_count(&self, chat_id: &ChatId) -> usize {
        self.registry.chat_connection_count(chat_id)
    }

    /// Serialize and route an event based on its scope. Fire-and-forget:
    /// delivery is best-effort and never awaited.
    pub fn send_message(&self, message: SseMessage) {
        let event_type = message.event.event_type();

        let event_data = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return;
            }
        };

        let event = Event::default().event(event_type).data(event_data);

        match message.scope {
            MessageScope::Chat { chat_id } => {
                self.registry.send_to_chat(&chat_id, event);
            }
            MessageScope::Broadcast => {
                self.registry.broadcast(event);
            }
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Event as SseEvent, Message, MessageScope};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn reaction_message(chat_id: &str) -> Message {
        Message {
            event: SseEvent::ReactionUpdated {
                chat_id: chat_id.to_string(),
                message_id: "100".to_string(),
                reactions: json!({"👍": ["u2"]}),
            },
            scope: MessageScope::Chat {
                chat_id: chat_id.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_event_delivered_to_all_clients_of_the_chat() {
        let manager = Manager::new();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();

        manager.register_connection("5".to_string(), "u1".to_string(), tx1);
        manager.register_connection("5".to_string(), "u2".to_string(), tx2);
        manager.register_connection("6".to_string(), "u3".to_string(), tx3);

        manager.send_message(reaction_message("5"));

        assert!(rx1.try_recv().is_ok(), "first chat-5 client should receive");
        assert!(rx2.try_recv().is_ok(), "second chat-5 client should receive");
        assert!(rx3.try_recv().is_err(), "chat-6 client must not receive");
    }

    #[tokio::test]
    async fn test_no_delivery_after_unregister() {
        let manager = Manager::new();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = manager.register_connection("5".to_string(), "u1".to_string(), tx);

        manager.unregister_connection(&connection_id);
        manager.send_message(reaction_message("5"));

        assert!(rx.try_recv().is_err());
        assert_eq!(manager.chat_connection_count(&"5".to_string()), 0);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let manager = Manager::new();

        let (tx, _rx) = mpsc::unbounded_channel();
        let connection_id = manager.register_connection("5".to_string(), "u1".to_string(), tx);

        manager.unregister_connection(&connection_id);
        manager.unregister_connection(&connection_id);

        assert_eq!(manager.chat_connection_count(&"5".to_string()), 0);
    }

    #[tokio::test]
    async fn test_dead_client_is_pruned_and_others_still_receive() {
        let manager = Manager::new();

        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();

        manager.register_connection("5".to_string(), "u1".to_string(), tx_dead);
        manager.register_connection("5".to_string(), "u2".to_string(), tx_live);

        // Simulate a client whose connection died without a clean close
        drop(rx_dead);

        manager.send_message(reaction_message("5"));

        assert!(rx_live.try_recv().is_ok(), "live client still receives");
        assert_eq!(
            manager.chat_connection_count(&"5".to_string()),
            1,
            "dead connection should have been unregistered"
        );
    }
}
