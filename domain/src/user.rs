use crate::error::Error;
use crate::users::{Model, Role};
use crate::Id;
use email_address::EmailAddress;
use log::*;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;

pub use entity_api::user::{
    find_by_email, find_by_id, update_profile, upsert_by_verified_email,
};

/// Raw login form credentials.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Verify a password against a stored hash. Returns `false` rather than
/// erroring when the stored hash is absent, empty, or unparseable (e.g. an
/// OAuth-only account with no password set).
pub fn verify_password(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(h) if !h.is_empty() => password_auth::verify_password(password, h).is_ok(),
        _ => false,
    }
}

/// Resolve credentials to a user. Unknown email and wrong password are
/// deliberately indistinguishable in the returned error.
pub async fn authenticate(
    db: &DatabaseConnection,
    credentials: Credentials,
) -> Result<Model, Error> {
    let user = find_by_email(db, &credentials.email).await?;

    match user {
        Some(user) if verify_password(&credentials.password, user.password.as_deref()) => Ok(user),
        _ => {
            info!("Authentication failed for submitted credentials");
            Err(Error::unauthenticated())
        }
    }
}

/// Register a new account with an email/password credential pair.
pub async fn register(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    display_name: Option<String>,
) -> Result<Model, Error> {
    if !EmailAddress::is_valid(email) || password.len() < 8 {
        return Err(Error::invalid());
    }

    if find_by_email(db, email).await?.is_some() {
        // Same outward shape as any other validation failure; existence of an
        // account is not disclosed beyond what registration inherently leaks.
        return Err(Error::invalid());
    }

    let user = entity_api::user::create(
        db,
        Model {
            id: Id::new_v4(),
            email: email.to_string(),
            password: Some(password.to_string()),
            display_name,
            nickname: None,
            email_verified_at: None,
            role: Role::User,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        },
    )
    .await?;

    Ok(user)
}

/// Admin-only role change.
pub async fn update_role(db: &DatabaseConnection, id: Id, role: Role) -> Result<Model, Error> {
    Ok(entity_api::user::update_role(db, id, role).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use password_auth::generate_hash;

    #[test]
    fn test_password_round_trip() {
        let hash = generate_hash("secret1");
        assert!(verify_password("secret1", Some(&hash)));
        assert!(!verify_password("secret2", Some(&hash)));
    }

    #[test]
    fn test_verify_password_with_missing_or_bad_hash_returns_false() {
        assert!(!verify_password("anything", None));
        assert!(!verify_password("anything", Some("")));
        assert!(!verify_password("anything", Some("not-a-phc-string")));
    }

    #[test]
    fn test_distinct_passwords_produce_distinct_hashes() {
        // Salted hashing: even the same input never collides across calls.
        assert_ne!(generate_hash("secret1"), generate_hash("secret1"));
    }
}
