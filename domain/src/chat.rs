//! Chat operations: membership-guarded message, reaction and pin mutations.
//!
//! Membership is enforced per request; there is no persistent "joined"
//! connection concept outside the SSE broker. Broadcasting to open streams is
//! the web layer's job - these functions only mutate state and return the
//! models the controllers serialize into push events.

use crate::chat_messages;
use crate::chats::{self, Kind};
use crate::error::Error;
use crate::users::Role;
use crate::{users, Id};
use log::*;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

pub use entity_api::chat::{find_by_id, find_by_user, is_member};
pub use entity_api::chat::find_members as members;

/// Require chat membership, mapping "not a member" to a 403-shaped error.
pub async fn ensure_member(db: &DatabaseConnection, chat_id: Id, user_id: Id) -> Result<(), Error> {
    if entity_api::chat::is_member(db, chat_id, user_id).await? {
        Ok(())
    } else {
        Err(Error::forbidden())
    }
}

/// Create a chat. A DM is always between exactly two users; a group requires
/// a name and at least one other member.
pub async fn create(
    db: &DatabaseConnection,
    creator: &users::Model,
    kind: Kind,
    name: Option<String>,
    member_ids: Vec<Id>,
) -> Result<chats::Model, Error> {
    let others: Vec<Id> = member_ids.into_iter().filter(|id| *id != creator.id).collect();

    match kind {
        Kind::Dm if others.len() != 1 => return Err(Error::invalid()),
        Kind::Group if others.is_empty() || name.as_deref().map_or(true, |n| n.trim().is_empty()) => {
            return Err(Error::invalid())
        }
        _ => {}
    }

    // Members must exist; a dangling id turns into NotFound before the insert.
    for member_id in &others {
        entity_api::user::find_by_id(db, *member_id).await?;
    }

    Ok(entity_api::chat::create_with_members(db, kind, name, creator.id, others).await?)
}

pub async fn messages(
    db: &DatabaseConnection,
    chat_id: Id,
    page: u64,
    per_page: u64,
) -> Result<Vec<chat_messages::Model>, Error> {
    Ok(entity_api::chat_message::find_by_chat(db, chat_id, page, per_page.clamp(1, 100)).await?)
}

pub async fn post_message(
    db: &DatabaseConnection,
    chat_id: Id,
    sender_id: Id,
    body: String,
) -> Result<chat_messages::Model, Error> {
    if body.trim().is_empty() {
        return Err(Error::invalid());
    }
    Ok(entity_api::chat_message::create(db, chat_id, sender_id, body).await?)
}

/// Soft-delete a message. Allowed for the sender, or for moderators/admins
/// acting on any message.
pub async fn delete_message(
    db: &DatabaseConnection,
    acting_user: &users::Model,
    chat_id: Id,
    message_id: Id,
) -> Result<chat_messages::Model, Error> {
    let message = entity_api::chat_message::find_by_id(db, message_id).await?;
    if message.chat_id != chat_id {
        return Err(Error::not_found());
    }

    let is_moderator = matches!(acting_user.role, Role::Moderator | Role::Admin);
    if message.sender_id != acting_user.id && !is_moderator {
        return Err(Error::forbidden());
    }

    Ok(entity_api::chat_message::soft_delete(db, message_id).await?)
}

/// Toggle one user's reaction on a message and return the updated message.
///
/// The map is read, modified and written back without a transaction: two
/// concurrent toggles on the same message can race and one can be lost. A
/// known, accepted weakness of the stored-JSON representation.
pub async fn toggle_reaction(
    db: &DatabaseConnection,
    user_id: Id,
    chat_id: Id,
    message_id: Id,
    emoji: &str,
) -> Result<chat_messages::Model, Error> {
    if emoji.is_empty() || emoji.len() > 32 {
        return Err(Error::invalid());
    }

    let message = entity_api::chat_message::find_by_id(db, message_id).await?;
    if message.chat_id != chat_id {
        return Err(Error::not_found());
    }

    let updated = toggled_reactions(message.reactions, emoji, &user_id.to_string());
    Ok(entity_api::chat_message::update_reactions(db, message_id, updated).await?)
}

/// Pure half of the reaction toggle: add the user to the emoji's set if
/// absent, remove them if present, and drop empty sets.
fn toggled_reactions(reactions: Value, emoji: &str, user_id: &str) -> Value {
    let mut map = match reactions {
        Value::Object(map) => map,
        _ => Default::default(),
    };

    let mut users: Vec<String> = map
        .get(emoji)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    if let Some(pos) = users.iter().position(|u| u == user_id) {
        users.remove(pos);
    } else {
        users.push(user_id.to_string());
    }

    if users.is_empty() {
        map.remove(emoji);
    } else {
        map.insert(emoji.to_string(), json!(users));
    }

    Value::Object(map)
}

/// Pin a message in its chat. The message must belong to the chat and not be
/// deleted.
pub async fn pin_message(
    db: &DatabaseConnection,
    chat_id: Id,
    message_id: Id,
) -> Result<chats::Model, Error> {
    let message = entity_api::chat_message::find_by_id(db, message_id).await?;
    if message.chat_id != chat_id || message.deleted_at.is_some() {
        return Err(Error::not_found());
    }

    debug!("Pinning message {message_id} in chat {chat_id}");
    Ok(entity_api::chat::set_pinned_message(db, chat_id, Some(message_id)).await?)
}

/// Clear the chat's pin; a chat with no current pin is left unchanged.
pub async fn clear_pin(db: &DatabaseConnection, chat_id: Id) -> Result<chats::Model, Error> {
    Ok(entity_api::chat::set_pinned_message(db, chat_id, None).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes_a_reaction() {
        let empty = json!({});

        let added = toggled_reactions(empty, "👍", "u2");
        assert_eq!(added, json!({"👍": ["u2"]}));

        let removed = toggled_reactions(added, "👍", "u2");
        assert_eq!(removed, json!({}));
    }

    #[test]
    fn test_toggle_preserves_other_users_and_emoji() {
        let reactions = json!({"👍": ["u1"], "🎉": ["u3"]});

        let updated = toggled_reactions(reactions, "👍", "u2");
        assert_eq!(updated["👍"], json!(["u1", "u2"]));
        assert_eq!(updated["🎉"], json!(["u3"]));
    }

    #[test]
    fn test_toggle_recovers_from_non_object_reactions_column() {
        let updated = toggled_reactions(Value::Null, "👍", "u1");
        assert_eq!(updated, json!({"👍": ["u1"]}));
    }
}
