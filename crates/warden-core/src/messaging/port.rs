use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the surface is kept to plain sends
/// plus the few moderation verbs (delete, pin) and the two broadcast extras
/// (poll, document). Every call is fire-and-forget from the caller's point of
/// view: the moderation path never blocks on delivery confirmation.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Direct message to a user's private chat.
    async fn dm_html(&self, user_id: UserId, html: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn pin_message(&self, msg: MessageRef) -> Result<()>;

    async fn send_poll(&self, chat_id: ChatId, question: &str, options: Vec<String>)
        -> Result<()>;

    async fn send_document(&self, chat_id: ChatId, file_name: &str, bytes: Vec<u8>) -> Result<()>;
}
