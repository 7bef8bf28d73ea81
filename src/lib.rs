//! modgate - A Telegram group moderation bot.
//!
//! This crate provides a permission-gated moderation command layer:
//! - Promote, demote, ban, temporary ban, kick and unban
//! - Message pinning and invite links
//! - Audit records delivered to a log chat

pub mod bot;
pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod moderation;
pub mod subscriber;
pub mod task;
pub mod telegram;
