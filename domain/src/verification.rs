//! One-time email verification tokens.
//!
//! The raw token only ever exists inside the emailed link; the database holds
//! its SHA-256 digest. Consumption is an atomic use-if-unused update, so a
//! link can be redeemed at most once no matter how many times it is clicked.

use crate::emails;
use crate::error::Error;
use crate::session::token_digest;
use crate::users;
use crate::verification_tokens::Purpose;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::*;
use rand::RngCore;
use sea_orm::DatabaseConnection;
use service::config::Config;

/// Generate a fresh opaque token: 32 random bytes, base64url without padding.
pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issue a verification token for an email address and send the link. The
/// raw token leaves the process only inside the email body.
pub async fn issue(
    db: &DatabaseConnection,
    config: &Config,
    email: &str,
    purpose: Purpose,
) -> Result<(), Error> {
    let raw_token = generate_token();

    entity_api::verification_token::create(
        db,
        email,
        token_digest(&raw_token),
        purpose,
        config.verification_token_ttl_hours,
    )
    .await?;

    emails::send_verification_email(config, email, &raw_token).await?;

    info!("Issued verification token for {email}");
    Ok(())
}

/// Redeem a raw token. Returns the verified user on first use, `None` on
/// anything else: expired, never existed, or already consumed. The three are
/// indistinguishable to the caller.
pub async fn consume(
    db: &DatabaseConnection,
    raw_token: &str,
) -> Result<Option<users::Model>, Error> {
    let row = entity_api::verification_token::consume(db, &token_digest(raw_token)).await?;

    match row {
        Some(token) => Ok(Some(
            entity_api::user::mark_email_verified(db, &token.email).await?,
        )),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(a.len(), 43);
        assert!(!a.contains('=') && !a.contains('+') && !a.contains('/'));
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::verification_tokens;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn token_row(digest: &str, used: bool) -> verification_tokens::Model {
        verification_tokens::Model {
            id: crate::Id::new_v4(),
            email: "a@x.com".to_string(),
            token_digest: digest.to_string(),
            purpose: Purpose::Signup,
            expires_at: (Utc::now() + Duration::hours(24)).into(),
            used_at: used.then(|| Utc::now().into()),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_second_consumption_of_same_token_returns_none() {
        let raw = generate_token();
        let digest = token_digest(&raw);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // First consume: conditional update hits one row
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[token_row(&digest, true)]])
            // mark_email_verified: find user, then update
            .append_query_results([[test_user()]])
            .append_query_results([[test_user()]])
            // Second consume: conditional update matches nothing
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let first = consume(&db, &raw).await.unwrap();
        assert_eq!(first.map(|user| user.email).as_deref(), Some("a@x.com"));

        let second = consume(&db, &raw).await.unwrap();
        assert!(second.is_none());
    }

    fn test_user() -> crate::users::Model {
        crate::users::Model {
            id: crate::Id::new_v4(),
            email: "a@x.com".to_string(),
            password: None,
            display_name: None,
            nickname: None,
            email_verified_at: None,
            role: crate::users::Role::User,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }
}
