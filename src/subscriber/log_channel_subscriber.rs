//! Delivers audit records to the configured log chat.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::chat::ChatId;
use crate::chat::Messenger;
use crate::event::AuditRecordEvent;
use crate::subscriber::Subscriber;

pub struct LogChannelSubscriber {
    messenger: Arc<dyn Messenger>,
    chat_id: ChatId,
}

impl LogChannelSubscriber {
    pub fn new(messenger: Arc<dyn Messenger>, chat_id: ChatId) -> Self {
        Self { messenger, chat_id }
    }
}

#[async_trait]
impl Subscriber<AuditRecordEvent> for LogChannelSubscriber {
    async fn callback(&self, event: AuditRecordEvent) -> Result<()> {
        debug!(
            "Sending {} record for chat {} to log chat {}",
            event.record.tag(),
            event.record.chat_id,
            self.chat_id
        );
        self.messenger
            .send_message(self.chat_id, &event.record.to_html(), None)
            .await?;
        Ok(())
    }
}
