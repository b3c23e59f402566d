use serde::Serialize;
use serde_json::Value;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    #[serde(rename = "message_created")]
    MessageCreated { chat_id: String, message: Value },
    #[serde(rename = "message_deleted")]
    MessageDeleted { chat_id: String, message_id: String },
    #[serde(rename = "reaction_updated")]
    ReactionUpdated {
        chat_id: String,
        message_id: String,
        reactions: Value,
    },
    #[serde(rename = "pin_updated")]
    PinUpdated {
        chat_id: String,
        pinned_message_id: Option<String>,
    },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::MessageCreated { .. } => "message_created",
            Event::MessageDeleted { .. } => "message_deleted",
            Event::ReactionUpdated { .. } => "reaction_updated",
            Event::PinUpdated { .. } => "pin_updated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to every connection currently open for a specific chat
    Chat { chat_id: String },
    /// Send to all connected clients (system notices)
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_with_tag_and_data() {
        let event = Event::ReactionUpdated {
            chat_id: "42".to_string(),
            message_id: "100".to_string(),
            reactions: json!({"👍": ["u2"]}),
        };

        let value: Value = serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(value["type"], "reaction_updated");
        assert_eq!(value["data"]["message_id"], "100");
        assert_eq!(value["data"]["reactions"]["👍"][0], "u2");
    }

    #[test]
    fn test_event_type_names() {
        let pin = Event::PinUpdated {
            chat_id: "1".to_string(),
            pinned_message_id: None,
        };
        assert_eq!(pin.event_type(), "pin_updated");
    }
}
