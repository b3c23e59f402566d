//! Business logic for the Mangapulse platform.
//!
//! Consumers of this crate (the `web` layer) never depend on `entity_api`
//! directly; the entity modules they need are re-exported here so layer
//! boundaries stay intact: `web` -> `domain` -> `entity_api` -> `entity`.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    chapters, chat_members, chat_messages, chats, comments, oauth_states, sessions, titles, users,
    verification_tokens, Id,
};

pub mod chapter;
pub mod chat;
pub mod comment;
pub mod emails;
pub mod error;
pub mod oauth;
pub mod session;
pub mod title;
pub mod user;
pub mod verification;

pub mod gateway;
