//! Core domain + application logic for the community moderation bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind a
//! port (trait) implemented in the adapter crate.

pub mod campaigns;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod moderation;
pub mod scheduler;
pub mod security;
pub mod store;
pub mod texts;
pub mod utils;

pub use errors::{Error, Result};
