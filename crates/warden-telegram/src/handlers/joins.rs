//! New-member welcome flow.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use warden_core::{
    domain::{ChatId, UserId},
    messaging::types::NewMember,
    utils::AuditEvent,
};

use crate::router::AppState;

pub async fn handle_new_members(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(users) = msg.new_chat_members() else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    for user in users {
        let member = NewMember {
            user_id: UserId(user.id.0 as i64),
            name: user.first_name.clone(),
        };

        state
            .engine
            .handle_join(state.messenger.as_ref(), chat_id, &member)
            .await;

        let event = AuditEvent::join(member.user_id.0, &member.name);
        if let Err(e) = state.audit.write(event) {
            eprintln!("[AUDIT] Failed to write join event: {e}");
        }
    }

    Ok(())
}
