//! One-shot deferred reminders.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{domain::ChatId, messaging::port::MessagingPort};

/// Fires a single broadcast after a delay.
///
/// Individual reminders carry no cancellation handle; a reminder that fails
/// at fire time is reported and dropped, never retried. `stop` tears down
/// whatever is still pending on shutdown.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    messenger: Arc<dyn MessagingPort>,
    cancel: CancellationToken,
    state: Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    pending: Vec<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                messenger,
                cancel: CancellationToken::new(),
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Deliver `html` to `chat_id` once `delay` has elapsed.
    pub async fn schedule(&self, chat_id: ChatId, delay: Duration, html: String) {
        let messenger = Arc::clone(&self.inner.messenger);
        let cancel = self.inner.cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep(delay) => {
                    if let Err(e) = messenger.send_html(chat_id, &html).await {
                        eprintln!("[REMIND] Scheduled reminder failed: {e}");
                    }
                }
            }
        });

        let mut st = self.inner.state.lock().await;
        st.pending.retain(|h| !h.is_finished());
        st.pending.push(handle);
    }

    /// Cancel everything still pending (shutdown path).
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let mut st = self.inner.state.lock().await;
        for handle in st.pending.drain(..) {
            handle.abort();
        }
    }
}
