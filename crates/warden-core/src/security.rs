use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

// ============== Authorization ==============

pub fn is_admin(user_id: Option<UserId>, admin_ids: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if admin_ids.is_empty() {
        return false;
    }
    admin_ids.contains(&user_id.0)
}

// ============== Rate Limiter (Minimum Interval) ==============

/// Per-user minimum-interval gate.
///
/// A user is admitted when their previous admitted event lies at least
/// `min_interval` in the past (or there is none). Rejected events leave the
/// stored timestamp untouched, so a burst keeps being measured against the
/// last admitted event rather than against itself.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_seen: HashMap<UserId, Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_seen: HashMap::new(),
        }
    }

    pub fn admit(&mut self, user_id: UserId) -> bool {
        self.admit_at(user_id, Instant::now())
    }

    pub fn admit_at(&mut self, user_id: UserId, now: Instant) -> bool {
        match self.last_seen.get(&user_id) {
            Some(&last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_seen.insert(user_id, now);
                true
            }
        }
    }
}
