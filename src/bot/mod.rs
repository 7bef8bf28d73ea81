//! Command dispatch between the update stream and the moderation executor.

pub mod commands;
pub mod error_handler;
pub mod response;

use std::sync::Arc;

use anyhow::Result;
use log::debug;
use log::warn;

use crate::bot::commands::Command;
use crate::bot::error_handler::ErrorHandler;
use crate::bot::response::CommandResponse;
use crate::chat::Message;
use crate::chat::Messenger;
use crate::config::Config;
use crate::event::AuditRecordEvent;
use crate::event::EventBus;
use crate::moderation::Invocation;
use crate::moderation::ModerationError;
use crate::moderation::Moderator;
use crate::moderation::moderator::require_group;

pub struct Bot {
    moderator: Arc<Moderator>,
    messenger: Arc<dyn Messenger>,
    event_bus: Arc<EventBus>,
    ban_sticker: Option<String>,
    prefixes: String,
}

impl Bot {
    pub fn new(
        config: &Config,
        moderator: Arc<Moderator>,
        messenger: Arc<dyn Messenger>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            moderator,
            messenger,
            event_bus,
            ban_sticker: config.ban_sticker.clone(),
            prefixes: config.command_prefixes.clone(),
        }
    }

    /// Handles one incoming message. Errors only surface when the reply
    /// itself could not be delivered.
    pub async fn handle_message(&self, message: Message) -> Result<()> {
        self.remember_authors(&message);

        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let bot_username = self.moderator.bot().username.as_deref();
        let Some(parsed) = commands::parse(text, &self.prefixes, bot_username) else {
            return Ok(());
        };
        let Some(actor) = message.from.clone() else {
            return Ok(());
        };

        debug!(
            "Command /{} from user {} in chat {}",
            parsed.command.name(),
            actor.id,
            message.chat.id
        );
        let inv = Invocation {
            actor,
            chat: message.chat.clone(),
            replied: message.reply_to.clone(),
            args: parsed.args,
        };

        let response = match self.execute(parsed.command, &inv).await {
            Ok(response) => response,
            Err(e) => ErrorHandler::handle(parsed.command, &e),
        };
        self.deliver(&message, response).await
    }

    pub async fn execute(
        &self,
        command: Command,
        inv: &Invocation,
    ) -> Result<CommandResponse, ModerationError> {
        let moderator = &self.moderator;
        let outcome = match command {
            Command::Promote => moderator.promote(inv).await,
            Command::Demote => moderator.demote(inv).await,
            Command::Ban => moderator.ban(inv).await,
            Command::TempBan => moderator.temp_ban(inv).await,
            Command::Kick => moderator.kick(inv).await,
            Command::KickMe => moderator.kick_me(inv).await,
            Command::Unban => moderator.unban(inv).await,
            Command::Pin => moderator.pin(inv).await,
            Command::Unpin => moderator.unpin(inv).await,
            Command::InviteLink => moderator.invite_link(inv).await,
            Command::AdminList => {
                require_group(&inv.chat)?;
                let list = moderator.admin_list(&inv.chat).await?;
                return Ok(CommandResponse::reply(list.to_html()));
            }
            Command::Settings => {
                require_group(&inv.chat)?;
                let is_admin = moderator.is_admin(inv.chat.id, inv.actor.id).await?;
                return Ok(CommandResponse::reply(format!(
                    "You are admin: <code>{is_admin}</code>"
                )));
            }
            Command::Help => return Ok(CommandResponse::reply(commands::help_text())),
        };
        outcome.map(CommandResponse::from_outcome)
    }

    async fn deliver(&self, message: &Message, response: CommandResponse) -> Result<()> {
        let chat_id = message.chat.id;

        if let Some(record) = response.record {
            self.event_bus.publish(AuditRecordEvent { record });
        }

        if response.sticker
            && let Some(sticker) = &self.ban_sticker
            && let Err(e) = self.messenger.send_sticker(chat_id, sticker).await
        {
            warn!("Failed to send ban sticker to chat {chat_id}: {e}");
        }

        if let Some(reply) = response.reply {
            self.messenger
                .send_message(chat_id, &reply, Some(message.id))
                .await?;
        }
        Ok(())
    }

    fn remember_authors(&self, message: &Message) {
        let directory = self.moderator.directory();
        if let Some(author) = &message.from {
            directory.remember(author);
        }
        if let Some(author) = message.reply_to.as_ref().and_then(|r| r.author.as_ref()) {
            directory.remember(author);
        }
    }
}
