//! Chat domain model and the remote chat-management collaborator.
//!
//! Everything in here is a plain snapshot of remote state. Nothing is cached
//! between command invocations; callers refetch through [`ChatApi`].

use std::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::chat::error::ApiError;

pub mod directory;
pub mod error;

pub use directory::InMemoryUserDirectory;
pub use directory::UserDirectory;

/// Numeric identity of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Numeric identity of a group, supergroup, channel or private chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl User {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            first_name: first_name.into(),
            last_name: None,
            username: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// HTML link that mentions the user without needing a username.
    pub fn mention_html(&self) -> String {
        format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            self.id,
            escape_html(&self.first_name)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    /// Groups and supergroups. Private chats and broadcast channels have no
    /// members to moderate.
    pub fn is_group_like(&self) -> bool {
        matches!(self, ChatType::Group | ChatType::Supergroup)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Public handle, without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
}

impl Chat {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("this chat")
    }
}

/// A single administrative permission bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ChangeInfo,
    PostMessages,
    EditMessages,
    DeleteMessages,
    InviteUsers,
    RestrictMembers,
    PinMessages,
    PromoteMembers,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::ChangeInfo,
        Capability::PostMessages,
        Capability::EditMessages,
        Capability::DeleteMessages,
        Capability::InviteUsers,
        Capability::RestrictMembers,
        Capability::PinMessages,
        Capability::PromoteMembers,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            Capability::ChangeInfo => "change chat info",
            Capability::PostMessages => "post messages",
            Capability::EditMessages => "edit messages",
            Capability::DeleteMessages => "delete messages",
            Capability::InviteUsers => "invite users",
            Capability::RestrictMembers => "restrict members",
            Capability::PinMessages => "pin messages",
            Capability::PromoteMembers => "add new admins",
        }
    }
}

/// The administrative permission set of one chat member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub can_change_info: bool,
    #[serde(default)]
    pub can_post_messages: bool,
    #[serde(default)]
    pub can_edit_messages: bool,
    #[serde(default)]
    pub can_delete_messages: bool,
    #[serde(default)]
    pub can_invite_users: bool,
    #[serde(default)]
    pub can_restrict_members: bool,
    #[serde(default)]
    pub can_pin_messages: bool,
    #[serde(default)]
    pub can_promote_members: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::ALL
            .iter()
            .fold(Self::none(), |caps, cap| caps.with(*cap))
    }

    pub fn contains(&self, cap: Capability) -> bool {
        match cap {
            Capability::ChangeInfo => self.can_change_info,
            Capability::PostMessages => self.can_post_messages,
            Capability::EditMessages => self.can_edit_messages,
            Capability::DeleteMessages => self.can_delete_messages,
            Capability::InviteUsers => self.can_invite_users,
            Capability::RestrictMembers => self.can_restrict_members,
            Capability::PinMessages => self.can_pin_messages,
            Capability::PromoteMembers => self.can_promote_members,
        }
    }

    pub fn with(mut self, cap: Capability) -> Self {
        *self.slot(cap) = true;
        self
    }

    pub fn without(mut self, cap: Capability) -> Self {
        *self.slot(cap) = false;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|cap| self.contains(*cap))
    }

    pub fn is_subset_of(&self, other: &Capabilities) -> bool {
        self.iter().all(|cap| other.contains(cap))
    }

    fn slot(&mut self, cap: Capability) -> &mut bool {
        match cap {
            Capability::ChangeInfo => &mut self.can_change_info,
            Capability::PostMessages => &mut self.can_post_messages,
            Capability::EditMessages => &mut self.can_edit_messages,
            Capability::DeleteMessages => &mut self.can_delete_messages,
            Capability::InviteUsers => &mut self.can_invite_users,
            Capability::RestrictMembers => &mut self.can_restrict_members,
            Capability::PinMessages => &mut self.can_pin_messages,
            Capability::PromoteMembers => &mut self.can_promote_members,
        }
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(caps: I) -> Self {
        caps.into_iter().fold(Self::none(), |acc, cap| acc.with(cap))
    }
}

/// Chat-scoped role of a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    /// `is_member` is false when a restricted user has left the chat.
    Restricted { is_member: bool },
    Left,
    Kicked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub status: MemberStatus,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl Member {
    pub fn new(user: User, status: MemberStatus) -> Self {
        Self {
            user,
            status,
            capabilities: Capabilities::none(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self.status,
            MemberStatus::Creator | MemberStatus::Administrator
        )
    }

    pub fn is_creator(&self) -> bool {
        self.status == MemberStatus::Creator
    }

    pub fn is_in_chat(&self) -> bool {
        match self.status {
            MemberStatus::Left | MemberStatus::Kicked => false,
            MemberStatus::Restricted { is_member } => is_member,
            _ => true,
        }
    }

    pub fn is_banned(&self) -> bool {
        self.status == MemberStatus::Kicked
    }

    /// The creator implicitly holds every capability.
    pub fn effective_capabilities(&self) -> Capabilities {
        if self.is_creator() {
            Capabilities::all()
        } else {
            self.capabilities
        }
    }
}

/// A message referenced by a command, usually the one replied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub id: MessageId,
    pub author: Option<User>,
}

/// An incoming chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub reply_to: Option<MessageRef>,
}

/// One item from the update stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub id: i64,
    pub message: Option<Message>,
}

/// Remote chat-management API.
///
/// Every call is a blocking, latency-bearing round trip. Implementations own
/// their timeout policy.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Returns `None` when the remote side does not know the user.
    async fn get_member(&self, chat_id: ChatId, user_id: UserId)
    -> Result<Option<Member>, ApiError>;

    async fn get_administrators(&self, chat_id: ChatId) -> Result<Vec<Member>, ApiError>;

    /// Replaces the member's administrative capabilities. An empty set demotes.
    async fn set_member_capabilities(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        capabilities: Capabilities,
    ) -> Result<(), ApiError>;

    /// Bans a member, permanently when `until` is `None`.
    async fn remove_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError>;

    /// Lifts a ban so the user may rejoin.
    async fn restore_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), ApiError>;

    /// Removes a member without leaving a restriction behind.
    ///
    /// The default composes a ban with an immediate unban. Adapters for APIs
    /// with a native kick should override it. If the unban fails after the
    /// ban went through, the error is [`ApiError::KickIncomplete`].
    async fn kick_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), ApiError> {
        self.remove_member(chat_id, user_id, None).await?;
        self.restore_member(chat_id, user_id)
            .await
            .map_err(|e| ApiError::KickIncomplete(Box::new(e)))
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        silent: bool,
    ) -> Result<(), ApiError>;

    async fn unpin_message(&self, chat_id: ChatId) -> Result<(), ApiError>;

    async fn get_or_create_invite_link(&self, chat_id: ChatId) -> Result<String, ApiError>;
}

/// Outbound messaging.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends HTML text, quoting `reply_to` when given.
    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), ApiError>;

    async fn send_sticker(&self, chat_id: ChatId, sticker: &str) -> Result<(), ApiError>;
}

/// Escapes text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
