pub use super::chapters::Entity as Chapters;
pub use super::chat_members::Entity as ChatMembers;
pub use super::chat_messages::Entity as ChatMessages;
pub use super::chats::Entity as Chats;
pub use super::comments::Entity as Comments;
pub use super::oauth_states::Entity as OauthStates;
pub use super::sessions::Entity as Sessions;
pub use super::titles::Entity as Titles;
pub use super::users::Entity as Users;
pub use super::verification_tokens::Entity as VerificationTokens;
