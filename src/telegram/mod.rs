//! Telegram Bot API adapter.

pub mod client;
pub mod types;

pub use client::GetUpdatesOpt;
pub use client::GetUpdatesOptBuilder;
pub use client::TelegramClient;
