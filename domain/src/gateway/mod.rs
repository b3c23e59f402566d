//! HTTP clients for external collaborators: the OAuth identity provider and
//! the MailerSend transactional email API.

pub mod mailersend;
pub mod oauth;
