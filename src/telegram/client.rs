//! HTTP client for the Telegram Bot API.

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use derive_builder::Builder;
use log::debug;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use wreq::header::CONTENT_TYPE;

use crate::chat::Capabilities;
use crate::chat::ChatApi;
use crate::chat::ChatId;
use crate::chat::Member;
use crate::chat::MessageId;
use crate::chat::Messenger;
use crate::chat::Update;
use crate::chat::User;
use crate::chat::UserId;
use crate::chat::error::ApiError;
use crate::telegram::types::ApiResponse;
use crate::telegram::types::TgChatMember;
use crate::telegram::types::TgUpdate;

/// Options for a `getUpdates` long poll.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "immutable")]
pub struct GetUpdatesOpt {
    #[builder(default, setter(strip_option))]
    pub offset: Option<i64>,
    #[builder(default = "30")]
    pub timeout: u64,
    #[builder(default = "100")]
    pub limit: u32,
}

pub struct TelegramClient {
    client: wreq::Client,
    /// `{api_url}/bot{token}`. Never logged.
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, ApiError> {
        let client = wreq::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Calls a Bot API method and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ApiError> {
        debug!("Calling Bot API method {method}");
        let request = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .header(CONTENT_TYPE, "application/json")
            .body(params.to_string());

        let response = request.send().await?;
        let body = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;

        let result = envelope.into_result();
        if let Err(e) = &result {
            debug!("Bot API method {method} failed: {e}");
        }
        result
    }

    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", json!({})).await
    }

    pub async fn get_updates(&self, opt: &GetUpdatesOpt) -> Result<Vec<Update>, ApiError> {
        let mut params = json!({
            "timeout": opt.timeout,
            "limit": opt.limit,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = opt.offset {
            params["offset"] = json!(offset);
        }

        let updates: Vec<TgUpdate> = self.call("getUpdates", params).await?;
        Ok(updates.into_iter().map(Update::from).collect())
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn get_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Option<Member>, ApiError> {
        let params = json!({ "chat_id": chat_id, "user_id": user_id });
        match self.call::<TgChatMember>("getChatMember", params).await {
            Ok(member) => Ok(Some(member.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_administrators(&self, chat_id: ChatId) -> Result<Vec<Member>, ApiError> {
        let admins: Vec<TgChatMember> = self
            .call("getChatAdministrators", json!({ "chat_id": chat_id }))
            .await?;
        Ok(admins.into_iter().map(Member::from).collect())
    }

    async fn set_member_capabilities(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        capabilities: Capabilities,
    ) -> Result<(), ApiError> {
        let mut params = serde_json::to_value(capabilities)?;
        params["chat_id"] = json!(chat_id);
        params["user_id"] = json!(user_id);
        self.call::<bool>("promoteChatMember", params).await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        let mut params = json!({ "chat_id": chat_id, "user_id": user_id });
        if let Some(until) = until {
            params["until_date"] = json!(until.timestamp());
        }
        self.call::<bool>("banChatMember", params).await?;
        Ok(())
    }

    async fn restore_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), ApiError> {
        // Without only_if_banned the API removes a present member.
        let params = json!({ "chat_id": chat_id, "user_id": user_id, "only_if_banned": true });
        self.call::<bool>("unbanChatMember", params).await?;
        Ok(())
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        silent: bool,
    ) -> Result<(), ApiError> {
        let params = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "disable_notification": silent,
        });
        self.call::<bool>("pinChatMessage", params).await?;
        Ok(())
    }

    async fn unpin_message(&self, chat_id: ChatId) -> Result<(), ApiError> {
        self.call::<bool>("unpinChatMessage", json!({ "chat_id": chat_id }))
            .await?;
        Ok(())
    }

    async fn get_or_create_invite_link(&self, chat_id: ChatId) -> Result<String, ApiError> {
        self.call("exportChatInviteLink", json!({ "chat_id": chat_id }))
            .await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), ApiError> {
        let mut params = json!({
            "chat_id": chat_id,
            "text": html,
            "parse_mode": "HTML",
            "link_preview_options": { "is_disabled": true },
        });
        if let Some(message_id) = reply_to {
            params["reply_parameters"] = json!({ "message_id": message_id });
        }

        match self.call::<Value>("sendMessage", params.clone()).await {
            Err(e) if reply_to.is_some() && e.is_reply_missing() => {
                warn!("Replied message vanished in chat {chat_id}, sending without quote");
                if let Some(obj) = params.as_object_mut() {
                    obj.remove("reply_parameters");
                }
                self.call::<Value>("sendMessage", params).await?;
                Ok(())
            }
            result => result.map(|_| ()),
        }
    }

    async fn send_sticker(&self, chat_id: ChatId, sticker: &str) -> Result<(), ApiError> {
        self.call::<Value>("sendSticker", json!({ "chat_id": chat_id, "sticker": sticker }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_updates_opt_defaults() {
        let opt = GetUpdatesOptBuilder::default().build().unwrap();
        assert_eq!(opt.offset, None);
        assert_eq!(opt.timeout, 30);
        assert_eq!(opt.limit, 100);

        let opt = GetUpdatesOptBuilder::default()
            .offset(42)
            .timeout(5)
            .build()
            .unwrap();
        assert_eq!(opt.offset, Some(42));
        assert_eq!(opt.timeout, 5);
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let client = TelegramClient::new("http://localhost:8081/", "123:abc").unwrap();
        assert_eq!(client.base_url, "http://localhost:8081/bot123:abc");
    }
}
