//! Admin-toggled campaign state (RSVP, attendance, feedback).

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

/// The three campaigns an admin can toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Campaign {
    Rsvp,
    Attendance,
    Feedback,
}

#[derive(Debug, Default)]
struct Links {
    rsvp: Option<String>,
    feedback: Option<String>,
}

/// Campaign flags plus the link each campaign points members at.
///
/// Flags are plain atomics so the moderation path reads them without taking a
/// lock. Links sit behind a mutex; only admin commands touch them. Disabling
/// a campaign clears the flag and nothing else: the last link stays around
/// until the next enable overwrites it.
#[derive(Debug, Default)]
pub struct Campaigns {
    rsvp_active: AtomicBool,
    attendance_active: AtomicBool,
    feedback_active: AtomicBool,
    links: Mutex<Links>,
}

impl Campaigns {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, kind: Campaign) -> &AtomicBool {
        match kind {
            Campaign::Rsvp => &self.rsvp_active,
            Campaign::Attendance => &self.attendance_active,
            Campaign::Feedback => &self.feedback_active,
        }
    }

    /// Turn a campaign on. The supplied link replaces whatever was stored
    /// before; `Attendance` carries no link.
    pub async fn enable(&self, kind: Campaign, link: Option<&str>) {
        if let Some(link) = link {
            let mut links = self.links.lock().await;
            match kind {
                Campaign::Rsvp => links.rsvp = Some(link.to_string()),
                Campaign::Feedback => links.feedback = Some(link.to_string()),
                Campaign::Attendance => {}
            }
        }
        // Link lands before the flag flips.
        self.flag(kind).store(true, Ordering::SeqCst);
    }

    /// Turn a campaign off. The stored link is deliberately left in place.
    pub fn disable(&self, kind: Campaign) {
        self.flag(kind).store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self, kind: Campaign) -> bool {
        self.flag(kind).load(Ordering::SeqCst)
    }

    pub async fn link_for(&self, kind: Campaign) -> Option<String> {
        let links = self.links.lock().await;
        match kind {
            Campaign::Rsvp => links.rsvp.clone(),
            Campaign::Feedback => links.feedback.clone(),
            Campaign::Attendance => None,
        }
    }
}
