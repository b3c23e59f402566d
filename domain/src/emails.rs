use crate::error::Error;
use crate::gateway::mailersend::{EmailRecipient, EmailSender, MailerSendClient, SendEmailRequest};
use log::*;
use service::config::Config;

const FROM_ADDRESS: &str = "hello@mangapulse.app";
const FROM_NAME: &str = "Mangapulse";

/// Build the verification link a recipient clicks. The raw token rides in the
/// query string; the endpoint it points at consumes it exactly once.
fn verification_link(config: &Config, raw_token: &str) -> Result<String, Error> {
    let base = config.public_base_url().ok_or_else(|| {
        error!("Public base URL not configured; cannot build verification links");
        Error::config()
    })?;

    Ok(format!(
        "{}/verify_email?token={}",
        base.trim_end_matches('/'),
        urlencoding::encode(raw_token)
    ))
}

/// Send the email verification message for a new or changed address.
pub async fn send_verification_email(
    config: &Config,
    email: &str,
    raw_token: &str,
) -> Result<(), Error> {
    let link = verification_link(config, raw_token)?;
    let mailersend_client = MailerSendClient::new(config)?;

    let request = SendEmailRequest {
        from: EmailSender {
            email: FROM_ADDRESS.to_string(),
            name: Some(FROM_NAME.to_string()),
        },
        to: vec![EmailRecipient {
            email: email.to_string(),
            name: None,
        }],
        subject: "Verify your Mangapulse email".to_string(),
        text: Some(format!(
            "Confirm your email address by opening this link:\n\n{link}\n\n\
             The link expires in {} hours. If you did not create an account, ignore this message.",
            config.verification_token_ttl_hours
        )),
        html: None,
        template_id: config.verification_email_template_id(),
    };

    mailersend_client.send_email(request).await?;
    debug!("Verification email queued for {email}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_verification_link_embeds_encoded_token() {
        std::env::set_var("PUBLIC_BASE_URL", "https://api.mangapulse.app/");
        let config = Config::parse_from(["manga_platform_rs"]);

        let link = verification_link(&config, "abc+/123").unwrap();
        assert_eq!(
            link,
            "https://api.mangapulse.app/verify_email?token=abc%2B%2F123"
        );
    }
}
