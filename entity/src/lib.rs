use uuid::Uuid;

pub mod prelude;

// Identity & credentials
pub mod oauth_states;
pub mod roles;
pub mod sessions;
pub mod users;
pub mod verification_tokens;

// Catalog
pub mod chapters;
pub mod titles;

// Community
pub mod chat_members;
pub mod chat_messages;
pub mod chats;
pub mod comments;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
