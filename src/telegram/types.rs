//! Wire types of the Bot API, converted into the chat domain model at the edge.

use serde::Deserialize;

use crate::chat::Capabilities;
use crate::chat::Chat;
use crate::chat::Member;
use crate::chat::MemberStatus;
use crate::chat::Message;
use crate::chat::MessageId;
use crate::chat::MessageRef;
use crate::chat::Update;
use crate::chat::User;
use crate::chat::error::ApiError;

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.ok {
            return Err(ApiError::Reported {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
                retry_after: self.parameters.and_then(|p| p.retry_after),
            });
        }
        self.result.ok_or_else(|| ApiError::UnexpectedResponse {
            message: "ok response without a result".to_string(),
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

impl From<TgUpdate> for Update {
    fn from(update: TgUpdate) -> Self {
        Self {
            id: update.update_id,
            message: update.message.map(Message::from),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: MessageId,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<Box<TgMessage>>,
}

impl From<TgMessage> for Message {
    fn from(message: TgMessage) -> Self {
        Self {
            id: message.message_id,
            chat: message.chat,
            from: message.from,
            text: message.text,
            reply_to: message.reply_to_message.map(|replied| MessageRef {
                id: replied.message_id,
                author: replied.from,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TgMemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TgChatMember {
    pub status: TgMemberStatus,
    pub user: User,
    #[serde(default)]
    pub is_member: Option<bool>,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

impl From<TgChatMember> for Member {
    fn from(member: TgChatMember) -> Self {
        let status = match member.status {
            TgMemberStatus::Creator => MemberStatus::Creator,
            TgMemberStatus::Administrator => MemberStatus::Administrator,
            TgMemberStatus::Member => MemberStatus::Member,
            TgMemberStatus::Restricted => MemberStatus::Restricted {
                is_member: member.is_member.unwrap_or(false),
            },
            TgMemberStatus::Left => MemberStatus::Left,
            TgMemberStatus::Kicked => MemberStatus::Kicked,
        };
        Member::new(member.user, status).with_capabilities(member.capabilities)
    }
}
