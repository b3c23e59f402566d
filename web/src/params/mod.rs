pub(crate) mod chapter;
pub(crate) mod chat;
pub(crate) mod comment;
pub(crate) mod title;
pub(crate) mod user;
