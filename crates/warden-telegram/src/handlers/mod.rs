//! Telegram update handlers.
//!
//! Each handler is a thin adapter: it reduces the teloxide update to core
//! types, calls into `warden-core`, and applies the outcome with best-effort
//! sends through the messaging port.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod joins;
mod moderation;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.new_chat_members().is_some() {
        return joins::handle_new_members(msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    moderation::handle_message(msg, state).await
}
