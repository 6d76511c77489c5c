//! The moderation core: one allow/delete decision per inbound message.
//!
//! Checks run in a fixed order (content, rate limit, thread restriction,
//! attendance logging); the first failed check deletes the message and stops.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use tokio::sync::Mutex;

use crate::{
    campaigns::{Campaign, Campaigns},
    config,
    domain::ChatId,
    filter::{self, Classification},
    messaging::{
        port::MessagingPort,
        types::{InboundMessage, NewMember},
    },
    security::{self, RateLimiter},
    store::Store,
    texts,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Delete(DeleteReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteReason {
    LinkPolicy,
    RateLimited,
    RestrictedThread,
}

impl DeleteReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteReason::LinkPolicy => "link_policy",
            DeleteReason::RateLimited => "rate_limited",
            DeleteReason::RestrictedThread => "restricted_thread",
        }
    }
}

/// Gates the one-time rules pin. The first caller to claim it wins; a failed
/// pin afterwards is not retried.
#[derive(Debug, Default)]
pub struct PinnedRules(AtomicBool);

impl PinnedRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once across the process lifetime.
    pub fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }
}

pub struct ModerationEngine {
    admin_ids: Vec<i64>,
    restricted_thread_id: Option<i32>,
    rate_limiter: Mutex<RateLimiter>,
    campaigns: Arc<Campaigns>,
    store: Store,
    pinned_rules: PinnedRules,
}

impl ModerationEngine {
    pub fn new(
        admin_ids: Vec<i64>,
        restricted_thread_id: Option<i32>,
        campaigns: Arc<Campaigns>,
        store: Store,
    ) -> Self {
        Self {
            admin_ids,
            restricted_thread_id,
            rate_limiter: Mutex::new(RateLimiter::new(config::MIN_MESSAGE_INTERVAL)),
            campaigns,
            store,
            pinned_rules: PinnedRules::new(),
        }
    }

    pub async fn evaluate(&self, msg: &InboundMessage) -> Verdict {
        self.evaluate_at(msg, Instant::now()).await
    }

    pub async fn evaluate_at(&self, msg: &InboundMessage, now: Instant) -> Verdict {
        // Non-text events (media, service messages) pass through untouched.
        let Some(text) = msg.text.as_deref() else {
            return Verdict::Allow;
        };
        let Some(sender) = msg.sender.as_ref() else {
            return Verdict::Allow;
        };

        // Flagged content never reaches the rate limiter, so a deleted link
        // message leaves the sender's window untouched.
        if filter::classify(text) == Classification::Flagged {
            return Verdict::Delete(DeleteReason::LinkPolicy);
        }

        {
            let mut limiter = self.rate_limiter.lock().await;
            if !limiter.admit_at(sender.user_id, now) {
                return Verdict::Delete(DeleteReason::RateLimited);
            }
        }

        if let Some(restricted) = self.restricted_thread_id {
            if msg.thread_id == Some(restricted)
                && !security::is_admin(Some(sender.user_id), &self.admin_ids)
            {
                return Verdict::Delete(DeleteReason::RestrictedThread);
            }
        }

        if self.campaigns.is_active(Campaign::Attendance) {
            // Best-effort: the message is already allowed either way.
            if let Err(e) = self
                .store
                .append_attendance(sender.user_id, &sender.name)
                .await
            {
                eprintln!(
                    "[WARDEN] Attendance log failed for {}: {e}",
                    sender.user_id.0
                );
            }
        }

        Verdict::Allow
    }

    /// The non-message join path: log the join, welcome the member in the
    /// group, DM them the rules, and pin the rules on the very first join.
    pub async fn handle_join(
        &self,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
        member: &NewMember,
    ) {
        if let Err(e) = self.store.append_join(member.user_id, &member.name).await {
            eprintln!("[WARDEN] Join log failed for {}: {e}", member.user_id.0);
        }

        if let Err(e) = messenger
            .send_html(chat_id, &texts::welcome(&member.name))
            .await
        {
            eprintln!("[WARDEN] Welcome send failed: {e}");
        }

        if let Err(e) = messenger.dm_html(member.user_id, texts::RULES).await {
            eprintln!("[WARDEN] Rules DM failed for {}: {e}", member.user_id.0);
        }

        if self.pinned_rules.claim() {
            match messenger.send_html(chat_id, texts::RULES).await {
                Ok(sent) => {
                    if let Err(e) = messenger.pin_message(sent).await {
                        eprintln!("[WARDEN] Rules pin failed: {e}");
                    }
                }
                Err(e) => eprintln!("[WARDEN] Rules post failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageId, MessageRef, UserId},
        messaging::types::Sender,
    };
    use async_trait::async_trait;
    use std::{
        path::PathBuf,
        sync::Mutex as StdMutex,
        time::Duration,
    };

    fn tmp_db(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.db"))
    }

    fn message(user: i64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(-100),
            message_id: MessageId(1),
            sender: Some(Sender {
                user_id: UserId(user),
                name: format!("user{user}"),
            }),
            text: Some(text.to_string()),
            thread_id: None,
        }
    }

    async fn engine(prefix: &str) -> (ModerationEngine, Arc<Campaigns>, Store) {
        let campaigns = Arc::new(Campaigns::new());
        let store = Store::new(&tmp_db(prefix)).await.unwrap();
        let engine = ModerationEngine::new(
            vec![999],
            Some(1),
            Arc::clone(&campaigns),
            store.clone(),
        );
        (engine, campaigns, store)
    }

    #[derive(Default)]
    struct FakeMessenger {
        sends: StdMutex<Vec<(ChatId, String)>>,
        dms: StdMutex<Vec<(UserId, String)>>,
        pins: StdMutex<Vec<MessageRef>>,
        next_id: StdMutex<i32>,
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> crate::Result<MessageRef> {
            self.sends.lock().unwrap().push((chat_id, html.to_string()));
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(*id),
            })
        }

        async fn dm_html(&self, user_id: UserId, html: &str) -> crate::Result<MessageRef> {
            self.dms.lock().unwrap().push((user_id, html.to_string()));
            Ok(MessageRef {
                chat_id: ChatId(user_id.0),
                message_id: MessageId(0),
            })
        }

        async fn delete_message(&self, _msg: MessageRef) -> crate::Result<()> {
            Ok(())
        }

        async fn pin_message(&self, msg: MessageRef) -> crate::Result<()> {
            self.pins.lock().unwrap().push(msg);
            Ok(())
        }

        async fn send_poll(
            &self,
            _chat_id: ChatId,
            _question: &str,
            _options: Vec<String>,
        ) -> crate::Result<()> {
            Ok(())
        }

        async fn send_document(
            &self,
            _chat_id: ChatId,
            _file_name: &str,
            _bytes: Vec<u8>,
        ) -> crate::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn messages_without_text_or_sender_pass_through() {
        let (engine, _campaigns, store) = engine("warden-mod-passthrough").await;
        let start = Instant::now();

        let mut no_text = message(1, "x");
        no_text.text = None;
        assert_eq!(engine.evaluate_at(&no_text, start).await, Verdict::Allow);

        let mut no_sender = message(1, "hello");
        no_sender.sender = None;
        assert_eq!(engine.evaluate_at(&no_sender, start).await, Verdict::Allow);

        assert_eq!(store.count_attendance().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn link_messages_are_deleted_without_touching_other_state() {
        let (engine, campaigns, store) = engine("warden-mod-links").await;
        campaigns.enable(Campaign::Attendance, None).await;
        let start = Instant::now();

        assert_eq!(
            engine.evaluate_at(&message(2, "hello"), start).await,
            Verdict::Allow
        );
        assert_eq!(
            engine
                .evaluate_at(
                    &message(2, "check this https://evil.example"),
                    start + Duration::from_millis(500),
                )
                .await,
            Verdict::Delete(DeleteReason::LinkPolicy)
        );

        // The deleted link message wrote nothing and consumed no window:
        // exactly 2.0s after the first admitted message the user is clear.
        assert_eq!(
            engine
                .evaluate_at(&message(2, "hello again"), start + Duration::from_secs(2))
                .await,
            Verdict::Allow
        );
        assert_eq!(store.count_attendance().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rapid_messages_are_rate_limited() {
        let (engine, _campaigns, _store) = engine("warden-mod-rate").await;
        let start = Instant::now();

        assert_eq!(
            engine.evaluate_at(&message(3, "first"), start).await,
            Verdict::Allow
        );
        assert_eq!(
            engine
                .evaluate_at(&message(3, "second"), start + Duration::from_millis(500))
                .await,
            Verdict::Delete(DeleteReason::RateLimited)
        );
        assert_eq!(
            engine
                .evaluate_at(
                    &message(3, "third"),
                    start + Duration::from_millis(500) + Duration::from_secs(3),
                )
                .await,
            Verdict::Allow
        );
    }

    #[tokio::test]
    async fn restricted_thread_is_admin_only() {
        let (engine, _campaigns, _store) = engine("warden-mod-thread").await;
        let start = Instant::now();

        let mut from_member = message(4, "hello");
        from_member.thread_id = Some(1);
        assert_eq!(
            engine.evaluate_at(&from_member, start).await,
            Verdict::Delete(DeleteReason::RestrictedThread)
        );

        let mut from_admin = message(999, "announcement");
        from_admin.thread_id = Some(1);
        assert_eq!(engine.evaluate_at(&from_admin, start).await, Verdict::Allow);

        let mut elsewhere = message(5, "hello");
        elsewhere.thread_id = Some(7);
        assert_eq!(engine.evaluate_at(&elsewhere, start).await, Verdict::Allow);
    }

    #[tokio::test]
    async fn unconfigured_thread_restriction_never_deletes() {
        let campaigns = Arc::new(Campaigns::new());
        let store = Store::new(&tmp_db("warden-mod-nothread")).await.unwrap();
        let engine = ModerationEngine::new(vec![999], None, campaigns, store);

        let mut msg = message(6, "hello");
        msg.thread_id = Some(1);
        assert_eq!(engine.evaluate(&msg).await, Verdict::Allow);
    }

    #[tokio::test]
    async fn active_attendance_logs_admitted_messages() {
        let (engine, campaigns, store) = engine("warden-mod-attend").await;
        campaigns.enable(Campaign::Attendance, None).await;
        let start = Instant::now();

        assert_eq!(
            engine.evaluate_at(&message(7, "hi"), start).await,
            Verdict::Allow
        );

        let rows = store.all_attendance().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 7);
        assert_eq!(rows[0].name, "user7");
    }

    #[tokio::test]
    async fn inactive_attendance_logs_nothing() {
        let (engine, _campaigns, store) = engine("warden-mod-noattend").await;

        assert_eq!(
            engine.evaluate_at(&message(8, "hi"), Instant::now()).await,
            Verdict::Allow
        );
        assert_eq!(store.count_attendance().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn attendance_log_failure_does_not_change_the_outcome() {
        let path = tmp_db("warden-mod-logfail");
        let campaigns = Arc::new(Campaigns::new());
        let store = Store::new(&path).await.unwrap();
        let engine =
            ModerationEngine::new(vec![999], Some(1), Arc::clone(&campaigns), store.clone());
        campaigns.enable(Campaign::Attendance, None).await;

        // A second connection drops the table out from under the engine.
        sqlite::open(&path)
            .unwrap()
            .execute("DROP TABLE attendance")
            .unwrap();

        assert_eq!(
            engine
                .evaluate_at(&message(9, "hello there"), Instant::now())
                .await,
            Verdict::Allow
        );
        assert!(store.count_attendance().await.is_err());
    }

    #[tokio::test]
    async fn join_logs_welcomes_and_pins_once() {
        let (engine, _campaigns, store) = engine("warden-mod-join").await;
        let messenger = FakeMessenger::default();
        let chat = ChatId(-100);

        let first = NewMember {
            user_id: UserId(11),
            name: "Dana".to_string(),
        };
        engine.handle_join(&messenger, chat, &first).await;

        assert_eq!(store.count_joins().await.unwrap(), 1);
        {
            let sends = messenger.sends.lock().unwrap();
            assert_eq!(sends.len(), 2); // welcome + pinned rules post
            assert!(sends[0].1.contains("Dana"));
            assert!(sends[1].1.contains("Community Rules"));
        }
        assert_eq!(messenger.dms.lock().unwrap().len(), 1);
        assert_eq!(messenger.pins.lock().unwrap().len(), 1);

        let second = NewMember {
            user_id: UserId(12),
            name: "Eli".to_string(),
        };
        engine.handle_join(&messenger, chat, &second).await;

        assert_eq!(store.count_joins().await.unwrap(), 2);
        // Second join: welcome only, no second rules pin.
        assert_eq!(messenger.sends.lock().unwrap().len(), 3);
        assert_eq!(messenger.pins.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn join_log_failure_still_runs_the_welcome_flow() {
        let path = tmp_db("warden-mod-joinfail");
        let campaigns = Arc::new(Campaigns::new());
        let store = Store::new(&path).await.unwrap();
        let engine = ModerationEngine::new(vec![999], None, campaigns, store.clone());
        let messenger = FakeMessenger::default();

        sqlite::open(&path)
            .unwrap()
            .execute("DROP TABLE joins")
            .unwrap();

        let member = NewMember {
            user_id: UserId(21),
            name: "Hana".to_string(),
        };
        engine.handle_join(&messenger, ChatId(-100), &member).await;

        assert!(store.count_joins().await.is_err());
        assert_eq!(messenger.sends.lock().unwrap().len(), 2);
        assert_eq!(messenger.dms.lock().unwrap().len(), 1);
        assert_eq!(messenger.pins.lock().unwrap().len(), 1);
    }

    #[test]
    fn pinned_rules_claim_is_single_shot() {
        let flag = PinnedRules::new();
        assert!(flag.claim());
        assert!(!flag.claim());
        assert!(!flag.claim());
    }
}
