use crate::error::Error;
use crate::titles;
use sea_orm::DatabaseConnection;

pub use entity_api::title::{find_all, find_by_id, find_by_slug};

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

pub async fn create(db: &DatabaseConnection, title_model: titles::Model) -> Result<titles::Model, Error> {
    if !is_valid_slug(&title_model.slug) || title_model.name.trim().is_empty() {
        return Err(Error::invalid());
    }
    if entity_api::title::find_by_slug(db, &title_model.slug)
        .await?
        .is_some()
    {
        return Err(Error::invalid());
    }

    Ok(entity_api::title::create(db, title_model).await?)
}

pub async fn update(
    db: &DatabaseConnection,
    id: crate::Id,
    title_model: titles::Model,
) -> Result<titles::Model, Error> {
    if title_model.name.trim().is_empty() {
        return Err(Error::invalid());
    }
    Ok(entity_api::title::update(db, id, title_model).await?)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: crate::Id) -> Result<(), Error> {
    Ok(entity_api::title::delete_by_id(db, id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("one-piece"));
        assert!(is_valid_slug("20th-century-boys"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("One-Piece"));
        assert!(!is_valid_slug("one piece"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
    }
}
