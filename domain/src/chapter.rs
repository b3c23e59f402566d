use crate::chapters;
use crate::error::Error;
use crate::Id;
use sea_orm::DatabaseConnection;

pub use entity_api::chapter::find_by_id;

pub async fn create(
    db: &DatabaseConnection,
    chapter_model: chapters::Model,
) -> Result<chapters::Model, Error> {
    if chapter_model.number < 0.0 || chapter_model.page_count < 1 {
        return Err(Error::invalid());
    }
    // The parent title must exist before we attach chapters to it.
    entity_api::title::find_by_id(db, chapter_model.title_id).await?;

    Ok(entity_api::chapter::create(db, chapter_model).await?)
}

/// List a title's chapters. Readers only see published chapters; moderators
/// see drafts as well.
pub async fn find_by_title(
    db: &DatabaseConnection,
    title_id: Id,
    include_unpublished: bool,
) -> Result<Vec<chapters::Model>, Error> {
    entity_api::title::find_by_id(db, title_id).await?;
    Ok(entity_api::chapter::find_by_title(db, title_id, include_unpublished).await?)
}
