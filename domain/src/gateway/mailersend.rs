use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use email_address::EmailAddress;
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;

/// MailerSend API client for sending transactional emails
pub struct MailerSendClient {
    client: reqwest::Client,
    base_url: String,
}

/// Email recipient with name and email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub email: String,
    pub name: Option<String>,
}

/// Email sender with name and email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSender {
    pub email: String,
    pub name: Option<String>,
}

/// Request payload for sending an email via MailerSend
#[derive(Debug, Serialize)]
pub struct SendEmailRequest {
    pub from: EmailSender,
    pub to: Vec<EmailRecipient>,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// Response from MailerSend API
#[derive(Debug, Deserialize)]
pub struct SendEmailResponse {
    pub message_id: Option<String>,
}

impl MailerSendClient {
    /// Create a new MailerSend client with authentication
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config.mailersend_api_key().ok_or_else(|| {
            warn!("MailerSend API key is not configured");
            Error::config()
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                Error::other("MailerSend API key contains invalid header characters")
            })?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.mailersend_base_url().to_string(),
        })
    }

    /// Send an email using MailerSend API
    pub async fn send_email(&self, request: SendEmailRequest) -> Result<SendEmailResponse, Error> {
        // Validate email addresses before handing them to the API
        if !is_valid_email(&request.from.email) {
            warn!("Invalid sender email: {}", request.from.email);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Invalid sender email address".to_string(),
                )),
            });
        }

        for recipient in &request.to {
            if !is_valid_email(&recipient.email) {
                warn!("Invalid recipient email: {}", recipient.email);
                return Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(format!(
                        "Invalid recipient email address: {}",
                        recipient.email
                    ))),
                });
            }
        }

        let url = format!("{}/email", self.base_url);

        info!("Sending email to {} recipients", request.to.len());
        debug!("Email subject: {}", request.subject);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            info!("Email sent successfully, message_id: {:?}", message_id);

            Ok(SendEmailResponse { message_id })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Failed to send email: {} - {}", status, error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            })
        }
    }
}

/// Validate email address format using email_address crate
pub fn is_valid_email(email: &str) -> bool {
    EmailAddress::is_valid(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mockito::Server;

    fn config_for(server_url: &str) -> Config {
        std::env::set_var("MAILERSEND_API_KEY", "test_api_key_123");
        std::env::set_var("MAILERSEND_BASE_URL", server_url);
        Config::parse_from(["manga_platform_rs"])
    }

    fn request_to(recipient: &str) -> SendEmailRequest {
        SendEmailRequest {
            from: EmailSender {
                email: "hello@mangapulse.app".to_string(),
                name: Some("Mangapulse".to_string()),
            },
            to: vec![EmailRecipient {
                email: recipient.to_string(),
                name: None,
            }],
            subject: "Verify your email".to_string(),
            text: Some("link".to_string()),
            html: None,
            template_id: None,
        }
    }

    #[tokio::test]
    async fn test_send_email_posts_to_email_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/email")
            .match_header("authorization", "Bearer test_api_key_123")
            .with_status(202)
            .with_header("x-message-id", "msg-1")
            .create_async()
            .await;

        let client = MailerSendClient::new(&config_for(&server.url())).unwrap();
        let response = client.send_email(request_to("user@example.com")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.message_id.as_deref(), Some("msg-1"));
    }

    #[tokio::test]
    async fn test_send_email_rejects_invalid_recipient_before_any_network_call() {
        let server = Server::new_async().await;
        let client = MailerSendClient::new(&config_for(&server.url())).unwrap();

        let result = client.send_email(request_to("not-an-email")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
    }
}
