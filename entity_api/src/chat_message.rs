use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::chat_messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, IntoActiveModel, QueryOrder, QuerySelect, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    chat_id: Id,
    sender_id: Id,
    body: String,
) -> Result<Model, Error> {
    let now = Utc::now();
    let message_active_model = ActiveModel {
        chat_id: Set(chat_id),
        sender_id: Set(sender_id),
        body: Set(body),
        reactions: Set(serde_json::json!({})),
        deleted_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(message_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Paginated catch-up fetch, newest first. The broker never replays missed
/// events, so this is the only way a late joiner backfills history.
/// Soft-deleted rows are excluded; serving them would resurrect bodies that
/// live clients were already told to drop via `MessageDeleted`.
pub async fn find_by_chat(
    db: &impl ConnectionTrait,
    chat_id: Id,
    page: u64,
    per_page: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ChatId.eq(chat_id))
        .filter(Column::DeletedAt.is_null())
        .order_by_desc(Column::CreatedAt)
        .offset(page * per_page)
        .limit(per_page)
        .all(db)
        .await?)
}

/// Soft delete: the row survives so pins and reaction history stay
/// addressable, but the body is no longer served.
pub async fn soft_delete(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.deleted_at = Set(Some(Utc::now().into()));
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

/// Replace the reactions map wholesale. Callers read-modify-write without a
/// transaction; two concurrent toggles on the same message can race and one
/// update can be lost. Accepted behavior, not an invariant.
pub async fn update_reactions(
    db: &impl ConnectionTrait,
    id: Id,
    reactions: serde_json::Value,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.reactions = Set(reactions);
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn find_by_chat_excludes_soft_deleted_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let _ = find_by_chat(&db, Id::new_v4(), 0, 50).await;

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"\"deleted_at\" IS NULL"#));
        assert!(log.contains(r#"\"chat_id\" ="#));

        Ok(())
    }
}
