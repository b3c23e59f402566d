use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::chat_members::{self, MemberRole};
use entity::chats::{ActiveModel, Column, Entity, Kind, Model};
use entity::Id;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set, TransactionTrait};

/// Create a chat and enroll its initial members in one transaction. The
/// creator is always enrolled as owner; everyone else joins as a plain
/// member.
pub async fn create_with_members(
    db: &(impl ConnectionTrait + TransactionTrait),
    kind: Kind,
    name: Option<String>,
    creator_id: Id,
    member_ids: Vec<Id>,
) -> Result<Model, Error> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let chat = ActiveModel {
        kind: Set(kind),
        name: Set(name),
        pinned_message_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    add_member(&txn, chat.id, creator_id, MemberRole::Owner).await?;
    for member_id in member_ids {
        if member_id != creator_id {
            add_member(&txn, chat.id, member_id, MemberRole::Member).await?;
        }
    }

    txn.commit().await?;
    Ok(chat)
}

/// Idempotent enrollment: re-adding an existing member is a no-op.
pub async fn add_member(
    db: &impl ConnectionTrait,
    chat_id: Id,
    user_id: Id,
    role: MemberRole,
) -> Result<(), Error> {
    let member = chat_members::ActiveModel {
        chat_id: Set(chat_id),
        user_id: Set(user_id),
        role: Set(role),
        joined_at: Set(Utc::now().into()),
    };

    chat_members::Entity::insert(member)
        .on_conflict(
            OnConflict::columns([chat_members::Column::ChatId, chat_members::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// All chats the user belongs to, most recently updated first.
pub async fn find_by_user(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .inner_join(chat_members::Entity)
        .filter(chat_members::Column::UserId.eq(user_id))
        .order_by_desc(Column::UpdatedAt)
        .all(db)
        .await?)
}

pub async fn is_member(
    db: &impl ConnectionTrait,
    chat_id: Id,
    user_id: Id,
) -> Result<bool, Error> {
    let member = chat_members::Entity::find_by_id((chat_id, user_id)).one(db).await?;
    Ok(member.is_some())
}

pub async fn find_members(db: &impl ConnectionTrait, chat_id: Id) -> Result<Vec<chat_members::Model>, Error> {
    Ok(chat_members::Entity::find()
        .filter(chat_members::Column::ChatId.eq(chat_id))
        .all(db)
        .await?)
}

/// Point the chat's pin at a message, or clear it with `None`.
pub async fn set_pinned_message(
    db: &impl ConnectionTrait,
    chat_id: Id,
    pinned_message_id: Option<Id>,
) -> Result<Model, Error> {
    let existing = find_by_id(db, chat_id).await?;
    let mut active_model: ActiveModel = existing.into();
    active_model.pinned_message_id = Set(pinned_message_id);
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}
