//! Session issuing, verification and revocation.
//!
//! A session is a signed, tamper-evident claims blob (HS256) handed to the
//! client once via the session cookie, plus a server-side row keyed by the
//! SHA-256 digest of that raw token. Signature verification is stateless and
//! treats any failing token as absent, never as an error; authenticated
//! requests additionally require the live server-side row, which is what
//! logout and revocation delete.

use crate::error::Error;
use crate::user::{self, Credentials};
use crate::users;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::config::Config;
use sha2::{Digest, Sha256};

/// Claims embedded in a signed session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

/// Hex SHA-256 digest of a raw token. This is the only form in which a
/// session or verification token is ever persisted.
pub fn token_digest(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

fn signing_secret(config: &Config) -> Result<String, Error> {
    config.session_signing_secret().ok_or_else(|| {
        warn!("Session signing secret is not configured");
        Error::config()
    })
}

/// Sign a session token for a verified user identity.
pub fn issue_session(config: &Config, user: &users::Model) -> Result<String, Error> {
    let secret = signing_secret(config)?;
    let now = Utc::now().timestamp() as usize;
    let claims = SessionClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: user.role.to_string(),
        iat: now,
        exp: now + config.session_expiry_seconds as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verify a presented token. Returns `None` on any failure (bad signature,
/// malformed token, elapsed expiry); callers treat `None` as anonymous.
pub fn verify_session(config: &Config, token: &str) -> Option<SessionClaims> {
    let secret = config.session_signing_secret()?;
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    match decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            trace!("Session token rejected: {e}");
            None
        }
    }
}

/// Persist the server-side row for an issued token. Only the digest is
/// stored; the raw token never touches the database.
pub async fn record(
    db: &DatabaseConnection,
    user_id: crate::Id,
    raw_token: &str,
    user_agent: Option<String>,
    ip_address: Option<String>,
    expires_at: chrono::DateTime<Utc>,
) -> Result<(), Error> {
    entity_api::session::create(
        db,
        user_id,
        token_digest(raw_token),
        user_agent,
        ip_address,
        expires_at.into(),
    )
    .await?;
    Ok(())
}

/// Authenticate credentials and issue a session. On success the raw token is
/// returned exactly once; only its digest is stored in the sessions table.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    credentials: Credentials,
    user_agent: Option<String>,
    ip_address: Option<String>,
) -> Result<(users::Model, String), Error> {
    let user = user::authenticate(db, credentials).await?;
    let token = issue_session(config, &user)?;

    let expires_at = Utc::now() + Duration::seconds(config.session_expiry_seconds as i64);
    record(db, user.id, &token, user_agent, ip_address, expires_at).await?;

    Ok((user, token))
}

/// Destroy the server-side session row for a presented token, if any. The
/// token may be anything the client sent back; a digest that matches nothing
/// is fine, as is running without a sessions table at all.
pub async fn logout(db: &DatabaseConnection, raw_token: Option<&str>) -> Result<(), Error> {
    if let Some(raw) = raw_token {
        entity_api::session::delete_by_digest(db, &token_digest(raw)).await?;
    }
    Ok(())
}

/// Record activity on the live session row for a presented token. Returns
/// whether such a row exists; logout and revocation delete the row, so a
/// signed token whose row is gone must be treated as no session at all.
pub async fn touch(db: &DatabaseConnection, raw_token: &str) -> Result<bool, Error> {
    Ok(entity_api::session::touch(db, &token_digest(raw_token)).await?)
}

/// Revoke every session a user holds (admin action, password reset).
pub async fn revoke_all(db: &DatabaseConnection, user_id: crate::Id) -> Result<u64, Error> {
    Ok(entity_api::session::delete_by_user(db, user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_config() -> Config {
        std::env::set_var("SESSION_SIGNING_SECRET", "test-signing-secret");
        Config::parse_from(["manga_platform_rs"])
    }

    fn test_user() -> users::Model {
        users::Model {
            id: crate::Id::new_v4(),
            email: "a@x.com".to_string(),
            password: None,
            display_name: Some("A".to_string()),
            nickname: None,
            email_verified_at: None,
            role: users::Role::User,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_issue_then_verify_round_trips_claims() {
        let config = test_config();
        let user = test_user();

        let token = issue_session(&config, &user).unwrap();
        let claims = verify_session(&config, &token).expect("token should verify");

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let config = test_config();
        let token = issue_session(&config, &test_user()).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(verify_session(&config, &tampered).is_none());
        assert!(verify_session(&config, "not-even-a-token").is_none());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let config = test_config();
        let user = test_user();

        let now = Utc::now().timestamp() as usize;
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            display_name: None,
            role: "user".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-signing-secret".as_bytes()),
        )
        .unwrap();

        assert!(verify_session(&config, &expired).is_none());
    }

    #[test]
    fn test_token_digest_is_stable_and_never_the_raw_value() {
        let digest = token_digest("some-raw-token");
        assert_eq!(digest, token_digest("some-raw-token"));
        assert_ne!(digest, "some-raw-token");
        assert_eq!(digest.len(), 64);
    }
}
