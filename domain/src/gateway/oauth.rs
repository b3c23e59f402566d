//! OAuth2 / OpenID Connect client for the external identity provider.
//!
//! Implements the authorization-code flow with PKCE (RFC 7636): the
//! authorization request carries a S256 code challenge, and the token
//! exchange proves possession of the matching verifier.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;

/// OAuth token response from the provider
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

/// OpenID userinfo for the authenticated account
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Form body for exchanging an authorization code for tokens
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    code: String,
    code_verifier: String,
    client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    redirect_uri: String,
    grant_type: String,
}

/// Configuration for the provider's endpoints
#[derive(Debug, Clone)]
pub struct ProviderUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// OAuth client bound to one registered application
pub struct OAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    urls: ProviderUrls,
}

impl OAuthClient {
    /// Create a new OAuth client with configurable URLs
    pub fn new(
        client_id: &str,
        client_secret: Option<String>,
        redirect_uri: &str,
        urls: ProviderUrls,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret,
            redirect_uri: redirect_uri.to_string(),
            urls,
        })
    }

    /// Build a client from the application config. Fails with a config error
    /// when the provider client id or redirect URI is not set.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client_id = config.oauth_client_id().ok_or_else(|| {
            warn!("OAuth client id is not configured");
            Error::config()
        })?;
        let redirect_uri = config.oauth_redirect_uri().ok_or_else(|| {
            warn!("OAuth redirect URI is not configured");
            Error::config()
        })?;

        Self::new(
            &client_id,
            config.oauth_client_secret(),
            &redirect_uri,
            ProviderUrls {
                auth_url: config.oauth_auth_url().to_string(),
                token_url: config.oauth_token_url().to_string(),
                userinfo_url: config.oauth_userinfo_url().to_string(),
            },
        )
    }

    /// Generate the authorization URL the user agent is redirected to.
    pub fn authorization_url(&self, state: &str, nonce: &str, code_challenge: &str) -> String {
        let scopes = ["openid", "email", "profile"].join(" ");

        format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            state={}&\
            nonce={}&\
            code_challenge={}&\
            code_challenge_method=S256",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state),
            urlencoding::encode(nonce),
            urlencoding::encode(code_challenge),
        )
    }

    /// Exchange an authorization code plus the PKCE verifier for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        };

        debug!("Exchanging OAuth authorization code for tokens");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Token exchange failed: {} - {}", status, error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    /// Fetch the OpenID userinfo document with an access token
    pub async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Userinfo request failed with status {status}");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            });
        }

        Ok(response.json::<UserInfo>().await?)
    }
}

/// Decode the payload segment of an id_token without verifying its signature.
///
/// Used only to read the `nonce` claim back out: the token was obtained
/// directly from the provider's token endpoint over TLS, so its integrity
/// comes from the channel, not the signature.
pub fn id_token_claims(id_token: &str) -> Result<serde_json::Value, Error> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::other("Malformed id_token"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Error::other("Malformed id_token payload encoding"))?;

    serde_json::from_slice(&bytes).map_err(|_| Error::other("Malformed id_token payload JSON"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_client(server_url: &str) -> OAuthClient {
        OAuthClient::new(
            "client-123",
            Some("shhh".to_string()),
            "https://api.mangapulse.app/oauth/callback",
            ProviderUrls {
                auth_url: format!("{server_url}/auth"),
                token_url: format!("{server_url}/token"),
                userinfo_url: format!("{server_url}/userinfo"),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_authorization_url_carries_pkce_parameters() {
        let client = test_client("https://provider.example");
        let url = client.authorization_url("st4te", "n0nce", "ch4llenge");

        assert!(url.starts_with("https://provider.example/auth?"));
        assert!(url.contains("code_challenge=ch4llenge"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("nonce=n0nce"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_verifier_to_token_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "auth-code".into()),
                Matcher::UrlEncoded("code_verifier".into(), "verifier-xyz".into()),
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "access_token": "at-1",
                    "id_token": "a.b.c",
                    "expires_in": 3600,
                    "token_type": "Bearer"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let tokens = client.exchange_code("auth-code", "verifier-xyz").await.unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "at-1");
        assert_eq!(tokens.id_token.as_deref(), Some("a.b.c"));
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_provider_rejection() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert!(client.exchange_code("bad", "verifier").await.is_err());
    }

    #[tokio::test]
    async fn test_get_user_info_parses_openid_document() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "sub": "provider-uid",
                    "email": "a@x.com",
                    "email_verified": true,
                    "name": "A"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let info = client.get_user_info("at-1").await.unwrap();
        assert_eq!(info.email, "a@x.com");
        assert!(info.email_verified);
    }

    #[test]
    fn test_id_token_claims_reads_nonce_from_payload() {
        let payload = URL_SAFE_NO_PAD.encode(json!({"nonce": "n0nce"}).to_string());
        let id_token = format!("header.{payload}.signature");

        let claims = id_token_claims(&id_token).unwrap();
        assert_eq!(claims["nonce"], "n0nce");

        assert!(id_token_claims("no-dots-here").is_err());
    }
}
