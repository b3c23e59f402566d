use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::comments::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, IntoActiveModel, QueryOrder, QuerySelect, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    title_id: Id,
    user_id: Id,
    body: String,
) -> Result<Model, Error> {
    let now = Utc::now();
    let comment_active_model = ActiveModel {
        title_id: Set(title_id),
        user_id: Set(user_id),
        body: Set(body),
        deleted_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(comment_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_title(
    db: &impl ConnectionTrait,
    title_id: Id,
    page: u64,
    per_page: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::TitleId.eq(title_id))
        .filter(Column::DeletedAt.is_null())
        .order_by_desc(Column::CreatedAt)
        .offset(page * per_page)
        .limit(per_page)
        .all(db)
        .await?)
}

pub async fn soft_delete(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.deleted_at = Set(Some(Utc::now().into()));
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}
