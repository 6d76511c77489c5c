use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Two messages from the same user closer together than this get the second
/// one deleted.
pub const MIN_MESSAGE_INTERVAL: Duration = Duration::from_secs(2);

/// A user who already received the rules waits this long before /rules
/// delivers them again.
pub const RULES_COOLDOWN: Duration = Duration::from_secs(30);

/// Typed configuration for the bot.
///
/// Everything comes from the environment (optionally via a local `.env`).
/// Missing required values abort startup; nothing here is re-read at runtime.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub channel_id: i64,
    pub admin_ids: Vec<i64>,

    // Moderation
    pub restricted_thread_id: Option<i32>,

    // Persistence
    pub db_path: PathBuf,
    pub audit_log_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let Some(channel_id) = env_i64("TELEGRAM_CHANNEL_ID") else {
            return Err(Error::Config(
                "TELEGRAM_CHANNEL_ID environment variable is required".to_string(),
            ));
        };

        let admin_ids = parse_csv_i64(env_str("TELEGRAM_ADMIN_IDS"));
        if admin_ids.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ADMIN_IDS environment variable is required".to_string(),
            ));
        }

        // Optional moderation knobs
        let restricted_thread_id = env_i32("TELEGRAM_RESTRICTED_THREAD_ID");

        // Persistence
        let db_path = env_path("WARDEN_DB_PATH").unwrap_or_else(|| PathBuf::from("warden.db"));
        let audit_log_path =
            env_path("AUDIT_LOG_PATH").unwrap_or_else(|| PathBuf::from("warden-audit.jsonl"));

        Ok(Self {
            telegram_bot_token,
            channel_id,
            admin_ids,
            restricted_thread_id,
            db_path,
            audit_log_path,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_i32(key: &str) -> Option<i32> {
    env_str(key).and_then(|s| s.trim().parse::<i32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}
