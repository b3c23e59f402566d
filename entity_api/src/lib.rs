pub use entity::{
    chapters, chat_members, chat_messages, chats, comments, oauth_states, sessions, titles, users,
    verification_tokens, Id,
};

pub mod chapter;
pub mod chat;
pub mod chat_message;
pub mod comment;
pub mod error;
pub mod oauth_state;
pub mod session;
pub mod title;
pub mod user;
pub mod verification_token;
