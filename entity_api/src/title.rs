use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::titles::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, IntoActiveModel, QueryOrder, Set};

pub async fn create(db: &impl ConnectionTrait, title_model: Model) -> Result<Model, Error> {
    let now = Utc::now();
    let title_active_model = ActiveModel {
        slug: Set(title_model.slug),
        name: Set(title_model.name),
        author: Set(title_model.author),
        description: Set(title_model.description),
        cover_key: Set(title_model.cover_key),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(title_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_slug(db: &impl ConnectionTrait, slug: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Slug.eq(slug)).one(db).await?)
}

/// Catalog listing with an optional case-insensitive name search.
pub async fn find_all(
    db: &impl ConnectionTrait,
    search: Option<String>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().order_by_asc(Column::Name);
    if let Some(term) = search {
        query = query.filter(Column::Name.contains(term.trim()));
    }
    Ok(query.all(db).await?)
}

pub async fn update(db: &impl ConnectionTrait, id: Id, title_model: Model) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.name = Set(title_model.name);
    active_model.author = Set(title_model.author);
    active_model.description = Set(title_model.description);
    active_model.cover_key = Set(title_model.cover_key);
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        });
    }
    Ok(())
}
