//! Long-polls the update stream and hands messages to the bot.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use tokio::time::sleep;

use crate::bot::Bot;
use crate::chat::Update;
use crate::chat::error::ApiError;
use crate::telegram::GetUpdatesOptBuilder;
use crate::telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Source of updates, acknowledged by passing the next offset.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> anyhow::Result<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> anyhow::Result<Vec<Update>> {
        let mut opt = GetUpdatesOptBuilder::default().timeout(timeout.as_secs());
        if let Some(offset) = offset {
            opt = opt.offset(offset);
        }
        Ok(self.get_updates(&opt.build()?).await?)
    }
}

pub struct UpdatePoller {
    source: Arc<dyn UpdateSource>,
    bot: Arc<Bot>,
    timeout: Duration,
    running: AtomicBool,
}

impl UpdatePoller {
    pub fn new(source: Arc<dyn UpdateSource>, bot: Arc<Bot>, timeout: Duration) -> Arc<Self> {
        info!("Initializing UpdatePoller with long-poll timeout {timeout:?}");
        Arc::new(Self {
            source,
            bot,
            timeout,
            running: AtomicBool::new(false),
        })
    }

    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("Starting UpdatePoller loop.");
            self.spawn_poll_loop();
        }
        Ok(())
    }

    /// Takes effect once the in-flight long poll returns.
    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping UpdatePoller loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn spawn_poll_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut offset = None;
            while self.running.load(Ordering::SeqCst) {
                match self.poll_once(offset).await {
                    Ok(next) => offset = next,
                    Err(e) => {
                        error!("Error polling updates: {e}");
                        sleep(retry_delay(&e)).await;
                    }
                }
            }
            info!("UpdatePoller loop stopped.");
        });
    }

    /// Fetches one batch and dispatches each message on its own task.
    /// Returns the offset that acknowledges the batch.
    pub async fn poll_once(&self, offset: Option<i64>) -> anyhow::Result<Option<i64>> {
        let updates = self.source.fetch_updates(offset, self.timeout).await?;
        if !updates.is_empty() {
            debug!("Received {} updates.", updates.len());
        }

        let mut next = offset;
        for update in updates {
            next = Some(update.id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let bot = self.bot.clone();
            tokio::spawn(async move {
                let chat_id = message.chat.id;
                if let Err(e) = bot.handle_message(message).await {
                    error!("Failed to handle message in chat {chat_id}: {e:?}");
                }
            });
        }
        Ok(next)
    }
}

/// Honors the server's flood-control hint when there is one.
fn retry_delay(error: &anyhow::Error) -> Duration {
    match error.downcast_ref::<ApiError>() {
        Some(ApiError::Reported {
            retry_after: Some(secs),
            ..
        }) => Duration::from_secs(*secs),
        _ => RETRY_DELAY,
    }
}
