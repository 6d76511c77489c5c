use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::Mutex;

use warden_core::{
    campaigns::Campaigns,
    config::{self, Config},
    messaging::port::MessagingPort,
    moderation::ModerationEngine,
    scheduler::ReminderScheduler,
    security::RateLimiter,
    store::Store,
    utils::AuditLogger,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub engine: Arc<ModerationEngine>,
    pub campaigns: Arc<Campaigns>,
    pub store: Store,
    pub scheduler: ReminderScheduler,
    pub rules_limiter: Arc<Mutex<RateLimiter>>,
    pub audit: Arc<AuditLogger>,
}

pub async fn run_polling(cfg: Arc<Config>, store: Store) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        println!("warden started: @{}", me.username());
    }
    println!("Broadcast channel: {}", cfg.channel_id);
    println!("Admins: {}", cfg.admin_ids.len());

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let campaigns = Arc::new(Campaigns::new());
    let engine = Arc::new(ModerationEngine::new(
        cfg.admin_ids.clone(),
        cfg.restricted_thread_id,
        Arc::clone(&campaigns),
        store.clone(),
    ));
    let scheduler = ReminderScheduler::new(Arc::clone(&messenger));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        messenger,
        engine,
        campaigns,
        store,
        scheduler,
        rules_limiter: Arc::new(Mutex::new(RateLimiter::new(config::RULES_COOLDOWN))),
        audit: Arc::new(AuditLogger::new(cfg.audit_log_path.clone())),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
