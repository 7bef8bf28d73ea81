//! Event subscribers that handle published events.

pub mod log_channel_subscriber;

pub use log_channel_subscriber::LogChannelSubscriber;

use anyhow::Result;

/// Trait for event subscribers.
#[async_trait::async_trait]
pub trait Subscriber<E> {
    /// Called when an event of type E is published.
    async fn callback(&self, event: E) -> Result<()>;
}
