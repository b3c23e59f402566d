use crate::comments;
use crate::error::Error;
use crate::users::{self, Role};
use crate::Id;
use sea_orm::DatabaseConnection;

pub async fn create(
    db: &DatabaseConnection,
    title_id: Id,
    user_id: Id,
    body: String,
) -> Result<comments::Model, Error> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.len() > 4000 {
        return Err(Error::invalid());
    }
    entity_api::title::find_by_id(db, title_id).await?;

    Ok(entity_api::comment::create(db, title_id, user_id, trimmed.to_string()).await?)
}

pub async fn find_by_title(
    db: &DatabaseConnection,
    title_id: Id,
    page: u64,
    per_page: u64,
) -> Result<Vec<comments::Model>, Error> {
    Ok(entity_api::comment::find_by_title(db, title_id, page, per_page.clamp(1, 100)).await?)
}

/// Soft-delete a comment. The author may delete their own; moderators and
/// admins may delete any.
pub async fn delete(
    db: &DatabaseConnection,
    acting_user: &users::Model,
    comment_id: Id,
) -> Result<comments::Model, Error> {
    let comment = entity_api::comment::find_by_id(db, comment_id).await?;

    let is_moderator = matches!(acting_user.role, Role::Moderator | Role::Admin);
    if comment.user_id != acting_user.id && !is_moderator {
        return Err(Error::forbidden());
    }

    Ok(entity_api::comment::soft_delete(db, comment_id).await?)
}
