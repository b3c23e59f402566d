//! OAuth PKCE login flow.
//!
//! `begin_login` stores an ephemeral handshake row (state, code verifier,
//! nonce, post-login redirect) and hands back the provider authorization URL.
//! `finish_login` consumes that row exactly once, exchanges the code, checks
//! the nonce, and upserts the local account keyed by the provider-verified
//! email.

use crate::error::Error;
use crate::gateway::oauth::{id_token_claims, OAuthClient};
use crate::user;
use crate::users;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::*;
use rand::RngCore;
use sea_orm::DatabaseConnection;
use service::config::Config;
use sha2::{Digest, Sha256};

/// Minutes an in-flight handshake stays valid before the row is ignored.
const STATE_TTL_MINUTES: i64 = 10;

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the S256 code challenge from a verifier (RFC 7636 §4.2).
pub fn code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Start the PKCE handshake. Returns the provider authorization URL to
/// redirect the user agent to.
pub async fn begin_login(
    db: &DatabaseConnection,
    config: &Config,
    redirect_to: Option<String>,
) -> Result<String, Error> {
    let client = OAuthClient::from_config(config)?;

    // Abandoned handshakes accumulate when users never return from the
    // provider; sweep them on the way in instead of with a background task.
    let swept = entity_api::oauth_state::delete_expired(db).await?;
    if swept > 0 {
        debug!("Removed {swept} expired OAuth handshake rows");
    }

    let code_verifier = random_token();
    let state = random_token();
    let nonce = random_token();

    entity_api::oauth_state::create(
        db,
        state.clone(),
        code_verifier.clone(),
        nonce.clone(),
        redirect_to,
        STATE_TTL_MINUTES,
    )
    .await?;

    info!("Redirecting user agent to OAuth provider");
    Ok(client.authorization_url(&state, &nonce, &code_challenge(&code_verifier)))
}

/// Complete the handshake on provider callback.
///
/// The stored state row is taken (looked up and deleted) before any token
/// exchange happens: an unknown or already-consumed state is rejected without
/// ever contacting the provider. Returns the local user and the post-login
/// redirect target.
pub async fn finish_login(
    db: &DatabaseConnection,
    config: &Config,
    code: &str,
    state: &str,
) -> Result<(users::Model, String), Error> {
    let Some(handshake) = entity_api::oauth_state::take(db, state).await? else {
        warn!("OAuth callback presented an unknown or consumed state");
        return Err(Error::unauthenticated());
    };

    let client = OAuthClient::from_config(config)?;
    let tokens = client
        .exchange_code(code, &handshake.code_verifier)
        .await
        .inspect_err(|e| warn!("OAuth code exchange failed: {e:?}"))?;

    // The nonce in the id_token must be the one minted for this handshake.
    let id_token = tokens.id_token.as_deref().ok_or_else(|| {
        warn!("Provider token response carried no id_token");
        Error::unauthenticated()
    })?;
    let claims = id_token_claims(id_token)?;
    if claims.get("nonce").and_then(|n| n.as_str()) != Some(handshake.nonce.as_str()) {
        warn!("OAuth id_token nonce mismatch");
        return Err(Error::unauthenticated());
    }

    let user_info = client
        .get_user_info(&tokens.access_token)
        .await
        .inspect_err(|e| warn!("OAuth userinfo fetch failed: {e:?}"))?;

    if !user_info.email_verified {
        warn!("Provider account email is not verified; refusing login");
        return Err(Error::unauthenticated());
    }

    let user = user::upsert_by_verified_email(db, &user_info.email, user_info.name).await?;

    let redirect_to = handshake.redirect_to.unwrap_or_else(|| "/".to_string());
    Ok((user, redirect_to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_challenge_matches_rfc_7636_appendix_b_vector() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cw"
        );
    }

    #[test]
    fn test_random_tokens_are_long_enough_for_pkce() {
        // RFC 7636 requires a verifier of 43..128 characters.
        let verifier = random_token();
        assert!(verifier.len() >= 43);
        assert_ne!(random_token(), random_token());
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use clap::Parser;
    use sea_orm::{DatabaseBackend, MockDatabase};

    /// An unknown state must be rejected before any token exchange. The mock
    /// database returns no handshake row and the config points at an
    /// unroutable provider, so reaching the exchange would fail loudly.
    #[tokio::test]
    async fn test_unknown_state_is_rejected_without_token_exchange() {
        std::env::set_var("OAUTH_CLIENT_ID", "client-123");
        std::env::set_var("OAUTH_REDIRECT_URI", "https://api.mangapulse.app/oauth/callback");
        let config = service::config::Config::parse_from(["manga_platform_rs"]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::oauth_states::Model>::new()])
            .into_connection();

        let result = finish_login(&db, &config, "some-code", "unknown-state").await;

        let err = result.expect_err("unknown state must fail");
        assert_eq!(
            err.error_kind,
            crate::error::DomainErrorKind::Internal(crate::error::InternalErrorKind::Entity(
                crate::error::EntityErrorKind::Unauthenticated
            ))
        );
    }
}
