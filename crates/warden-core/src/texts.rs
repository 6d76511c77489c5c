//! Canned bot texts.
//!
//! Every user-facing string lives here so the handlers stay free of string
//! soup. Builders escape user-supplied fragments for Telegram HTML mode.

use crate::formatting::escape_html;

pub const START: &str = "Hi 👋 I'm the community helper bot.\nType /help";

pub const HELP: &str = "<b>🤖 Bot commands</b>\n\
/rules – community rules (sent by DM)\n\
/events – upcoming events (sent by DM)\n\
/help – this message\n\
Admins also have /announce, /remind and /poll.";

pub const RULES: &str = "<b>📜 Community Rules</b>\n\
1. Be respectful\n\
2. No spam or unsolicited links\n\
3. Keep discussions on topic";

pub const EVENTS: &str = "<b>📅 Upcoming events</b>\n\
• Hackathon – dates TBA\n\
• Workshop – coming soon";

pub fn welcome(first_name: &str) -> String {
    format!(
        "Welcome {} 👋\nCheck your DM for the rules.",
        escape_html(first_name)
    )
}

pub fn reminder(text: &str) -> String {
    format!("📢 <b>Reminder</b>\n{}", escape_html(text))
}

pub fn rsvp_open(event: &str, link: &str) -> String {
    format!(
        "📝 <b>RSVP open:</b> {}\nSign up here: {}",
        escape_html(event),
        escape_html(link)
    )
}

pub const RSVP_CLOSED: &str = "RSVP closed.";

pub fn feedback_open(link: &str) -> String {
    format!(
        "🗒 <b>Feedback time!</b>\nTell us what you think: {}",
        escape_html(link)
    )
}

pub const FEEDBACK_CLOSED: &str = "Feedback collection closed.";

pub const ATTENDANCE_OPEN: &str =
    "✅ <b>Attendance is open.</b>\nSend any message in the chat to be counted.";

pub const ATTENDANCE_CLOSED: &str = "Attendance closed.";

pub fn certificate(name: &str) -> String {
    format!(
        "🏆 <b>Certificate of Participation</b>\nAwarded to: {}",
        escape_html(name)
    )
}

pub fn stats(joins: i64, attendance: i64) -> String {
    format!("📊 <b>Stats</b>\nJoins: {joins}\nAttendance marks: {attendance}")
}

pub const POLL_QUESTION: &str = "Will you participate?";

pub fn poll_options() -> Vec<String> {
    vec!["Yes".to_string(), "Maybe".to_string(), "No".to_string()]
}

pub const EXPORT_FAILED: &str = "⚠️ Export failed, try again later.";

pub const STATS_FAILED: &str = "⚠️ Stats unavailable, try again later.";

// Usage replies for malformed admin commands. Angle brackets are entities
// because these strings travel through HTML parse mode.
pub const USAGE_RSVP_ON: &str = "Usage: /rsvp_on &lt;event name&gt; &lt;link&gt;";
pub const USAGE_FEEDBACK_ON: &str = "Usage: /feedback_on &lt;link&gt;";
pub const USAGE_CERTIFICATE: &str = "Usage: /certificate &lt;name&gt;";
pub const USAGE_REMIND: &str = "Usage: /remind &lt;delay seconds&gt; &lt;message&gt;";
pub const USAGE_ANNOUNCE: &str = "Usage: /announce &lt;text&gt;";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_escapes_the_display_name() {
        let text = welcome("<Mallory & Co>");
        assert!(text.contains("&lt;Mallory &amp; Co&gt;"));
        assert!(!text.contains("<Mallory"));
    }

    #[test]
    fn reminder_carries_the_header() {
        let text = reminder("meeting at 5");
        assert!(text.starts_with("📢"));
        assert!(text.contains("meeting at 5"));
    }

    #[test]
    fn rsvp_text_names_event_and_link() {
        let text = rsvp_open("Hack Night", "https://forms.example/x?a=1&b=2");
        assert!(text.contains("Hack Night"));
        assert!(text.contains("https://forms.example/x?a=1&amp;b=2"));
    }
}
