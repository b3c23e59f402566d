use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::users::{ActiveModel, Column, Entity, Model, Role};
use entity::Id;
use log::*;
use password_auth::generate_hash;
use sea_orm::{entity::prelude::*, ConnectionTrait, IntoActiveModel, Set};

/// Insert a new user row. The email is normalized to lowercase so that
/// uniqueness checks are case-insensitive, and the password (when present)
/// is stored only as its argon2 hash.
pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {:?}", user_model.email);

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        email: Set(user_model.email.trim().to_lowercase()),
        password: Set(user_model.password.map(|password| generate_hash(password))),
        display_name: Set(user_model.display_name),
        nickname: Set(user_model.nickname),
        email_verified_at: Set(user_model.email_verified_at),
        role: Set(user_model.role),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Update the mutable profile fields; everything else (email, role,
/// verification state) changes through its own operation.
pub async fn update_profile(
    db: &impl ConnectionTrait,
    id: Id,
    display_name: Option<String>,
    nickname: Option<String>,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.display_name = Set(display_name);
    active_model.nickname = Set(nickname);
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

pub async fn update_role(db: &impl ConnectionTrait, id: Id, role: Role) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    let mut active_model = existing.into_active_model();
    active_model.role = Set(role);
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

pub async fn mark_email_verified(db: &impl ConnectionTrait, email: &str) -> Result<Model, Error> {
    let existing = find_by_email(db, email).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })?;
    let mut active_model = existing.into_active_model();
    active_model.email_verified_at = Set(Some(Utc::now().into()));
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

/// Find-or-create used by the OAuth callback: the provider has already
/// verified the email, so a freshly created account carries no password and
/// is marked verified immediately.
pub async fn upsert_by_verified_email(
    db: &impl ConnectionTrait,
    email: &str,
    display_name: Option<String>,
) -> Result<Model, Error> {
    if let Some(existing) = find_by_email(db, email).await? {
        if existing.email_verified_at.is_some() {
            return Ok(existing);
        }
        let mut active_model = existing.into_active_model();
        active_model.email_verified_at = Set(Some(Utc::now().into()));
        active_model.updated_at = Set(Utc::now().into());
        return Ok(active_model.update(db).await?);
    }

    create(
        db,
        Model {
            id: Id::new_v4(),
            email: email.to_string(),
            password: None,
            display_name,
            nickname: None,
            email_verified_at: Some(Utc::now().into()),
            role: Role::User,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        },
    )
    .await
}
