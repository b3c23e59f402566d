use super::error::Error;
use chrono::{Duration, Utc};

use entity::verification_tokens::{ActiveModel, Column, Entity, Model, Purpose};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    email: &str,
    token_digest: String,
    purpose: Purpose,
    ttl_hours: i64,
) -> Result<Model, Error> {
    let now = Utc::now();
    let token_active_model = ActiveModel {
        email: Set(email.trim().to_lowercase()),
        token_digest: Set(token_digest),
        purpose: Set(purpose),
        expires_at: Set((now + Duration::hours(ttl_hours)).into()),
        used_at: Set(None),
        created_at: Set(now.into()),
        ..Default::default()
    };

    Ok(token_active_model.insert(db).await?)
}

/// Consume a token: a single conditional UPDATE marks it used if and only if
/// it is still unused and unexpired. Exactly one concurrent caller can win;
/// everyone else observes zero affected rows and gets `None`.
pub async fn consume(db: &impl ConnectionTrait, token_digest: &str) -> Result<Option<Model>, Error> {
    let now = DateTimeWithTimeZone::from(Utc::now());

    let result = Entity::update_many()
        .col_expr(Column::UsedAt, Expr::value(Some(now)))
        .filter(Column::TokenDigest.eq(token_digest))
        .filter(Column::UsedAt.is_null())
        .filter(Column::ExpiresAt.gt(now))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("Verification token digest matched no consumable row");
        return Ok(None);
    }

    Ok(Entity::find()
        .filter(Column::TokenDigest.eq(token_digest))
        .one(db)
        .await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::Id;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn consume_returns_none_when_no_consumable_row_matched() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(consume(&db, "used-or-unknown-digest").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn consume_returns_the_row_when_the_conditional_update_wins() -> Result<(), Error> {
        let now = Utc::now();
        let token_model = Model {
            id: Id::new_v4(),
            email: "reader@example.com".to_string(),
            token_digest: "winning-digest".to_string(),
            purpose: Purpose::Signup,
            expires_at: (now + Duration::hours(24)).into(),
            used_at: Some(now.into()),
            created_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![token_model.clone()]])
            .into_connection();

        let consumed = consume(&db, "winning-digest").await?;

        assert_eq!(consumed, Some(token_model));

        Ok(())
    }
}
