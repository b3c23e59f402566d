use domain::chats::Kind;
use domain::Id;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Path parameters for chat-scoped routes. Deserialized by field name so the
/// same struct works for `/chats/{chat_id}` and for nested message routes.
#[derive(Debug, Deserialize)]
pub struct ChatPath {
    pub chat_id: Id,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessagePath {
    pub chat_id: Id,
    pub message_id: Id,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CreateParams {
    pub kind: Kind,
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Uuid>)]
    #[param(value_type = Vec<Uuid>)]
    pub member_ids: Vec<Id>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CreateMessageParams {
    pub body: String,
}

/// Reverse-chronological message pagination.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MessageIndexParams {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReactionParams {
    pub emoji: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PinParams {
    #[schema(value_type = Uuid)]
    #[param(value_type = Uuid)]
    pub message_id: Id,
}

pub(crate) fn default_per_page() -> u64 {
    50
}
