//! Messenger-agnostic update and action model (Telegram today).

pub mod port;
pub mod types;
