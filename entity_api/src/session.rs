use super::error::Error;
use chrono::Utc;

use entity::sessions::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

/// Record a newly issued session. Only the SHA-256 digest of the raw token is
/// persisted.
pub async fn create(
    db: &impl ConnectionTrait,
    user_id: Id,
    token_digest: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    expires_at: chrono::DateTime<chrono::FixedOffset>,
) -> Result<Model, Error> {
    let now = Utc::now();
    let session_active_model = ActiveModel {
        user_id: Set(user_id),
        token_digest: Set(token_digest),
        user_agent: Set(user_agent),
        ip_address: Set(ip_address),
        created_at: Set(now.into()),
        last_used_at: Set(now.into()),
        expires_at: Set(expires_at),
        ..Default::default()
    };

    Ok(session_active_model.insert(db).await?)
}

/// Delete the session row matching a token digest. A missing row is not an
/// error: older deployments ran without a sessions table at all, and logout
/// must still succeed.
pub async fn delete_by_digest(db: &impl ConnectionTrait, token_digest: &str) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::TokenDigest.eq(token_digest))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("No stored session row matched the presented token digest");
    }
    Ok(())
}

/// Revoke every session belonging to a user (admin action / password change).
pub async fn delete_by_user(db: &impl ConnectionTrait, user_id: Id) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Bump `last_used_at` for the live session matching a digest. Returns whether
/// a non-expired row was found; rows past `expires_at` are never matched, so a
/// logged-out or expired session reports `false`.
pub async fn touch(db: &impl ConnectionTrait, token_digest: &str) -> Result<bool, Error> {
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::LastUsedAt, Expr::value(DateTimeWithTimeZone::from(now)))
        .filter(Column::TokenDigest.eq(token_digest))
        .filter(Column::ExpiresAt.gt(DateTimeWithTimeZone::from(now)))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn touch_reports_true_for_a_live_session() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(touch(&db, "digest-of-a-live-token").await?);

        Ok(())
    }

    #[tokio::test]
    async fn touch_reports_false_for_a_revoked_or_expired_session() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(!touch(&db, "digest-with-no-live-row").await?);

        Ok(())
    }

    #[tokio::test]
    async fn delete_by_digest_tolerates_a_missing_row() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        delete_by_digest(&db, "unknown-digest").await?;

        Ok(())
    }
}
