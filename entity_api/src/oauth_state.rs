use super::error::Error;
use chrono::{Duration, Utc};

use entity::oauth_states::{ActiveModel, Column, Entity, Model};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    state: String,
    code_verifier: String,
    nonce: String,
    redirect_to: Option<String>,
    ttl_minutes: i64,
) -> Result<Model, Error> {
    let now = Utc::now();
    let state_active_model = ActiveModel {
        state: Set(state),
        code_verifier: Set(code_verifier),
        nonce: Set(nonce),
        redirect_to: Set(redirect_to),
        created_at: Set(now.into()),
        expires_at: Set((now + Duration::minutes(ttl_minutes)).into()),
        ..Default::default()
    };

    Ok(state_active_model.insert(db).await?)
}

/// Look up and delete the handshake row for a `state` nonce in one shot.
/// Returns `None` when the state is unknown, expired, or was already taken by
/// a concurrent callback (the delete-by-id acts as the one-time gate).
pub async fn take(db: &impl ConnectionTrait, state: &str) -> Result<Option<Model>, Error> {
    let now = DateTimeWithTimeZone::from(Utc::now());

    let Some(row) = Entity::find()
        .filter(Column::State.eq(state))
        .filter(Column::ExpiresAt.gt(now))
        .one(db)
        .await?
    else {
        debug!("OAuth state matched no live handshake row");
        return Ok(None);
    };

    let result = Entity::delete_many()
        .filter(Column::Id.eq(row.id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Lost the race against another callback presenting the same state.
        return Ok(None);
    }

    Ok(Some(row))
}

/// Periodic cleanup of abandoned handshakes.
pub async fn delete_expired(db: &impl ConnectionTrait) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lte(DateTimeWithTimeZone::from(Utc::now())))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
