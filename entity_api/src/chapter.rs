use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::chapters::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

pub async fn create(db: &impl ConnectionTrait, chapter_model: Model) -> Result<Model, Error> {
    let now = Utc::now();
    let chapter_active_model = ActiveModel {
        title_id: Set(chapter_model.title_id),
        number: Set(chapter_model.number),
        name: Set(chapter_model.name),
        page_count: Set(chapter_model.page_count),
        published_at: Set(chapter_model.published_at),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(chapter_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Chapters of a title in reading order. Unpublished chapters are only
/// included when `include_unpublished` is set (moderator views).
pub async fn find_by_title(
    db: &impl ConnectionTrait,
    title_id: Id,
    include_unpublished: bool,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find()
        .filter(Column::TitleId.eq(title_id))
        .order_by_asc(Column::Number);
    if !include_unpublished {
        query = query.filter(Column::PublishedAt.is_not_null());
    }
    Ok(query.all(db).await?)
}
