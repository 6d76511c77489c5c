//! Public and admin chat commands.

use std::{sync::Arc, time::Duration};

use teloxide::{prelude::*, types::Message};

use warden_core::{
    campaigns::Campaign,
    domain::{ChatId, MessageId, MessageRef, UserId},
    formatting::escape_html,
    security::is_admin,
    store::attendance_csv,
    texts,
    utils::AuditEvent,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Everything `run_command` needs, shed of teloxide types.
struct CommandInvocation {
    chat_id: ChatId,
    msg_ref: MessageRef,
    user_id: Option<UserId>,
    user_name: String,
    command: String,
    args: String,
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text().map(|s| s.to_string()) else {
        return Ok(());
    };
    let (command, args) = parse_command(&text);

    let chat_id = ChatId(msg.chat.id.0);
    let invocation = CommandInvocation {
        chat_id,
        msg_ref: MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        },
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        user_name: msg
            .from()
            .map(|u| u.first_name.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        command,
        args,
    };

    run_command(&state, invocation).await;
    Ok(())
}

async fn run_command(state: &AppState, inv: CommandInvocation) {
    match inv.command.as_str() {
        "start" => {
            send_to(state, inv.chat_id, texts::START).await;
        }
        "help" => {
            best_effort_delete(state, inv.msg_ref).await;
            let Some(user_id) = inv.user_id else {
                return;
            };
            dm_user(state, user_id, texts::HELP).await;
        }
        "rules" => {
            best_effort_delete(state, inv.msg_ref).await;
            let Some(user_id) = inv.user_id else {
                return;
            };
            // On cooldown the command stays silent; the admitted request
            // stamps the cooldown window before the DM goes out.
            let admitted = {
                let mut limiter = state.rules_limiter.lock().await;
                limiter.admit(user_id)
            };
            if admitted {
                dm_user(state, user_id, texts::RULES).await;
            }
        }
        "events" => {
            best_effort_delete(state, inv.msg_ref).await;
            let Some(user_id) = inv.user_id else {
                return;
            };
            dm_user(state, user_id, texts::EVENTS).await;
        }
        "rsvp_on" | "rsvp_off" | "feedback_on" | "feedback_off" | "attendance_on"
        | "attendance_off" | "export" | "stats" | "certificate" | "remind" | "announce"
        | "poll" => {
            // The command message comes down even when the sender turns out
            // not to be an admin; only the reply is withheld.
            best_effort_delete(state, inv.msg_ref).await;
            admin_command(state, &inv).await;
        }
        _ => {} // unknown commands are ignored
    }
}

async fn admin_command(state: &AppState, inv: &CommandInvocation) {
    let authorized = is_admin(inv.user_id, &state.cfg.admin_ids);

    let event = AuditEvent::admin_command(
        inv.user_id.map(|u| u.0).unwrap_or(0),
        &inv.user_name,
        &format!("/{}", inv.command),
        authorized,
    );
    if let Err(e) = state.audit.write(event) {
        eprintln!("[AUDIT] Failed to write admin command event: {e}");
    }

    if !authorized {
        // Silent no-op: unauthorized invocations get no reply at all.
        return;
    }

    let channel = ChatId(state.cfg.channel_id);

    match inv.command.as_str() {
        "rsvp_on" => {
            let Some((event_name, link)) = split_rsvp_args(&inv.args) else {
                send_to(state, inv.chat_id, texts::USAGE_RSVP_ON).await;
                return;
            };
            state.campaigns.enable(Campaign::Rsvp, Some(link)).await;
            send_to(state, channel, &texts::rsvp_open(event_name, link)).await;
        }
        "rsvp_off" => {
            state.campaigns.disable(Campaign::Rsvp);
            send_to(state, inv.chat_id, texts::RSVP_CLOSED).await;
        }
        "feedback_on" => {
            let Some(link) = inv.args.split_whitespace().next() else {
                send_to(state, inv.chat_id, texts::USAGE_FEEDBACK_ON).await;
                return;
            };
            state.campaigns.enable(Campaign::Feedback, Some(link)).await;
            send_to(state, channel, &texts::feedback_open(link)).await;
        }
        "feedback_off" => {
            state.campaigns.disable(Campaign::Feedback);
            send_to(state, inv.chat_id, texts::FEEDBACK_CLOSED).await;
        }
        "attendance_on" => {
            state.campaigns.enable(Campaign::Attendance, None).await;
            send_to(state, channel, texts::ATTENDANCE_OPEN).await;
        }
        "attendance_off" => {
            state.campaigns.disable(Campaign::Attendance);
            send_to(state, inv.chat_id, texts::ATTENDANCE_CLOSED).await;
        }
        "export" => {
            export_attendance(state, inv.chat_id).await;
        }
        "stats" => {
            send_stats(state, inv.chat_id).await;
        }
        "certificate" => {
            let name = inv.args.trim();
            if name.is_empty() {
                send_to(state, inv.chat_id, texts::USAGE_CERTIFICATE).await;
                return;
            }
            send_to(state, inv.chat_id, &texts::certificate(name)).await;
        }
        "remind" => {
            let Some((delay, message)) = split_remind_args(&inv.args) else {
                send_to(state, inv.chat_id, texts::USAGE_REMIND).await;
                return;
            };
            state
                .scheduler
                .schedule(channel, delay, texts::reminder(message))
                .await;
        }
        "announce" => {
            let text = inv.args.trim();
            if text.is_empty() {
                send_to(state, inv.chat_id, texts::USAGE_ANNOUNCE).await;
                return;
            }
            send_to(state, channel, &escape_html(text)).await;
        }
        "poll" => {
            if let Err(e) = state
                .messenger
                .send_poll(inv.chat_id, texts::POLL_QUESTION, texts::poll_options())
                .await
            {
                eprintln!("[WARDEN] Poll send failed: {e}");
            }
        }
        _ => {}
    }
}

/// `<event name...> <link>`: the link is the last token, the event name is
/// everything before it.
fn split_rsvp_args(args: &str) -> Option<(&str, &str)> {
    let (event_name, link) = args.trim().rsplit_once(char::is_whitespace)?;
    let event_name = event_name.trim();
    if event_name.is_empty() || link.is_empty() {
        return None;
    }
    Some((event_name, link))
}

/// `<delay seconds> <message...>`.
fn split_remind_args(args: &str) -> Option<(Duration, &str)> {
    let (delay, message) = args.trim().split_once(char::is_whitespace)?;
    let secs = delay.parse::<u64>().ok()?;
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some((Duration::from_secs(secs), message))
}

async fn export_attendance(state: &AppState, chat_id: ChatId) {
    let records = match state.store.all_attendance().await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("[WARDEN] Export read failed: {e}");
            send_to(state, chat_id, texts::EXPORT_FAILED).await;
            return;
        }
    };

    let csv = attendance_csv(&records);
    if let Err(e) = state
        .messenger
        .send_document(chat_id, "attendance.csv", csv.into_bytes())
        .await
    {
        eprintln!("[WARDEN] Export send failed: {e}");
    }
}

async fn send_stats(state: &AppState, chat_id: ChatId) {
    let joins = state.store.count_joins().await;
    let attendance = state.store.count_attendance().await;
    match (joins, attendance) {
        (Ok(joins), Ok(attendance)) => {
            send_to(state, chat_id, &texts::stats(joins, attendance)).await;
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("[WARDEN] Stats read failed: {e}");
            send_to(state, chat_id, texts::STATS_FAILED).await;
        }
    }
}

async fn send_to(state: &AppState, chat_id: ChatId, html: &str) {
    if let Err(e) = state.messenger.send_html(chat_id, html).await {
        eprintln!("[WARDEN] Send failed: {e}");
    }
}

async fn dm_user(state: &AppState, user_id: UserId, html: &str) {
    if let Err(e) = state.messenger.dm_html(user_id, html).await {
        eprintln!("[WARDEN] DM failed for {}: {e}", user_id.0);
    }
}

async fn best_effort_delete(state: &AppState, msg_ref: MessageRef) {
    if let Err(e) = state.messenger.delete_message(msg_ref).await {
        eprintln!("[WARDEN] Failed to delete command message: {e}");
    }
}
