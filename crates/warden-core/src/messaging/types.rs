use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// An incoming group message reduced to what moderation needs.
///
/// Telegram-specific fields stay in the Telegram adapter; this struct is
/// consumed by the moderation engine and thrown away.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub thread_id: Option<i32>,
}

impl InboundMessage {
    pub fn msg_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sender {
    pub user_id: UserId,
    pub name: String,
}

/// A freshly joined member.
#[derive(Clone, Debug)]
pub struct NewMember {
    pub user_id: UserId,
    pub name: String,
}
