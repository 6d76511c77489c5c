//! Group message moderation.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use warden_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{InboundMessage, Sender},
    moderation::Verdict,
    utils::AuditEvent,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let inbound = InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        sender: msg.from().map(|u| Sender {
            user_id: UserId(u.id.0 as i64),
            name: u.first_name.clone(),
        }),
        text: msg.text().map(|s| s.to_string()),
        thread_id: msg.thread_id,
    };

    let Verdict::Delete(reason) = state.engine.evaluate(&inbound).await else {
        return Ok(());
    };

    let user_id = inbound.sender.as_ref().map(|s| s.user_id.0).unwrap_or(0);
    let name = inbound
        .sender
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("unknown");

    // Best-effort: a failed delete is logged and forgotten.
    if let Err(e) = state.messenger.delete_message(inbound.msg_ref()).await {
        eprintln!("[WARDEN] Failed to delete message: {e}");
        let event = AuditEvent::error(user_id, name, &e.to_string(), Some("delete_message"));
        if let Err(e) = state.audit.write(event) {
            eprintln!("[AUDIT] Failed to write error event: {e}");
        }
    }

    let event = AuditEvent::deletion(
        user_id,
        name,
        reason.as_str(),
        inbound.text.as_deref().unwrap_or(""),
    );
    if let Err(e) = state.audit.write(event) {
        eprintln!("[AUDIT] Failed to write deletion event: {e}");
    }

    Ok(())
}
