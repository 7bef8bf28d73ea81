//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use modgate::chat::Capabilities;
use modgate::chat::Chat;
use modgate::chat::ChatApi;
use modgate::chat::ChatId;
use modgate::chat::ChatType;
use modgate::chat::InMemoryUserDirectory;
use modgate::chat::Member;
use modgate::chat::MemberStatus;
use modgate::chat::MessageId;
use modgate::chat::MessageRef;
use modgate::chat::Messenger;
use modgate::chat::Update;
use modgate::chat::User;
use modgate::chat::UserId;
use modgate::chat::error::ApiError;
use modgate::moderation::Invocation;
use modgate::moderation::Moderator;
use modgate::moderation::resolver::tokenize;
use modgate::task::update_poller::UpdateSource;

#[allow(dead_code)]
pub const CHAT_ID: ChatId = ChatId(-100123);
#[allow(dead_code)]
pub const LOG_CHAT_ID: ChatId = ChatId(-100999);
#[allow(dead_code)]
pub const BOT_ID: i64 = 1;
#[allow(dead_code)]
pub const ADMIN_ID: i64 = 2;
#[allow(dead_code)]
pub const USER_ID: i64 = 3;

#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn group() -> Chat {
    Chat {
        id: CHAT_ID,
        title: Some("Rustaceans".to_string()),
        kind: ChatType::Supergroup,
        username: None,
    }
}

#[allow(dead_code)]
pub fn bot_user() -> User {
    User {
        is_bot: true,
        ..User::new(BOT_ID, "modgate").with_username("modgate_bot")
    }
}

#[allow(dead_code)]
pub fn admin() -> User {
    User::new(ADMIN_ID, "Ann").with_username("ann")
}

#[allow(dead_code)]
pub fn user() -> User {
    User::new(USER_ID, "Bob").with_username("bob")
}

#[allow(dead_code)]
pub fn invocation(actor: User, args: &str) -> Invocation {
    Invocation {
        actor,
        chat: group(),
        replied: None,
        args: tokenize(args),
    }
}

#[allow(dead_code)]
pub fn reply_invocation(actor: User, replied: MessageRef, args: &str) -> Invocation {
    Invocation {
        replied: Some(replied),
        ..invocation(actor, args)
    }
}

/// A chat with an all-powerful bot, one admin and one ordinary member.
#[allow(dead_code)]
pub fn setup() -> (Arc<MockChatApi>, Moderator) {
    setup_with_bot_capabilities(Capabilities::all())
}

#[allow(dead_code)]
pub fn setup_with_bot_capabilities(caps: Capabilities) -> (Arc<MockChatApi>, Moderator) {
    let api = Arc::new(MockChatApi::new());
    api.add_member(Member::new(bot_user(), MemberStatus::Administrator).with_capabilities(caps));
    api.add_member(
        Member::new(admin(), MemberStatus::Administrator).with_capabilities(Capabilities::all()),
    );
    api.add_member(Member::new(user(), MemberStatus::Member));

    let moderator = Moderator::new(
        api.clone(),
        Arc::new(InMemoryUserDirectory::new()),
        bot_user(),
    )
    .with_clock(fixed_now);
    (api, moderator)
}

// MOCK CHAT API

/// A remote mutation as the mock received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    SetCapabilities(UserId, Capabilities),
    Remove(UserId, Option<DateTime<Utc>>),
    Restore(UserId),
    Pin(MessageId, bool),
    Unpin,
    ExportInvite,
}

/// How a mocked Bot API method fails.
#[derive(Clone, Debug)]
pub enum Failure {
    /// An error the API reported with a code and description.
    Reported(i64, String),
    /// A response the client cannot make sense of.
    Unexpected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

/// State for the mock chat.
#[derive(Default, Clone)]
pub struct MockChatState {
    pub members: HashMap<UserId, Member>,
    pub pinned: Option<MessageId>,
    pub invite_link: Option<String>,
    pub calls: Vec<Call>,
    pub sent: Vec<SentMessage>,
    pub stickers: Vec<(ChatId, String)>,
    /// Bot API method name to the error it answers with.
    pub failures: HashMap<&'static str, Failure>,
}

/// Single-chat mock that behaves like the Bot API for the methods in use.
#[derive(Clone, Default)]
pub struct MockChatApi {
    pub state: Arc<RwLock<MockChatState>>,
}

#[allow(dead_code)]
impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, member: Member) {
        self.state
            .write()
            .unwrap()
            .members
            .insert(member.user.id, member);
    }

    pub fn member(&self, id: i64) -> Option<Member> {
        self.state.read().unwrap().members.get(&UserId(id)).cloned()
    }

    pub fn status(&self, id: i64) -> Option<MemberStatus> {
        self.member(id).map(|m| m.status)
    }

    pub fn set_failure(&self, method: &'static str, code: i64, description: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(method, Failure::Reported(code, description.to_string()));
    }

    pub fn set_unexpected_failure(&self, method: &'static str) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(method, Failure::Unexpected);
    }

    pub fn set_pinned(&self, message_id: Option<MessageId>) {
        self.state.write().unwrap().pinned = message_id;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.read().unwrap().calls.clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.read().unwrap().sent.clone()
    }

    pub fn stickers(&self) -> Vec<(ChatId, String)> {
        self.state.read().unwrap().stickers.clone()
    }

    fn fail(&self, method: &'static str) -> Result<(), ApiError> {
        match self.state.read().unwrap().failures.get(method) {
            Some(Failure::Reported(code, description)) => {
                Err(ApiError::reported(*code, description))
            }
            Some(Failure::Unexpected) => Err(ApiError::UnexpectedResponse {
                message: format!("{method} returned ok without a result"),
            }),
            None => Ok(()),
        }
    }

    fn record(&self, call: Call) {
        self.state.write().unwrap().calls.push(call);
    }

    fn set_status(&self, user_id: UserId, status: MemberStatus, caps: Capabilities) {
        let mut state = self.state.write().unwrap();
        let member = state
            .members
            .entry(user_id)
            .or_insert_with(|| Member::new(User::new(user_id.0, "Unknown"), MemberStatus::Left));
        member.status = status;
        member.capabilities = caps;
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn get_member(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Option<Member>, ApiError> {
        self.fail("getChatMember")?;
        Ok(self.state.read().unwrap().members.get(&user_id).cloned())
    }

    async fn get_administrators(&self, _chat_id: ChatId) -> Result<Vec<Member>, ApiError> {
        self.fail("getChatAdministrators")?;
        let state = self.state.read().unwrap();
        let mut admins: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.is_admin())
            .cloned()
            .collect();
        admins.sort_by_key(|m| m.user.id.0);
        Ok(admins)
    }

    async fn set_member_capabilities(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
        capabilities: Capabilities,
    ) -> Result<(), ApiError> {
        self.record(Call::SetCapabilities(user_id, capabilities));
        self.fail("promoteChatMember")?;
        let status = if capabilities == Capabilities::none() {
            MemberStatus::Member
        } else {
            MemberStatus::Administrator
        };
        self.set_status(user_id, status, capabilities);
        Ok(())
    }

    async fn remove_member(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        self.record(Call::Remove(user_id, until));
        self.fail("banChatMember")?;
        self.set_status(user_id, MemberStatus::Kicked, Capabilities::none());
        Ok(())
    }

    async fn restore_member(&self, _chat_id: ChatId, user_id: UserId) -> Result<(), ApiError> {
        self.record(Call::Restore(user_id));
        self.fail("unbanChatMember")?;
        // Only lifts bans; present members are left alone.
        if self.status(user_id.0) == Some(MemberStatus::Kicked) {
            self.set_status(user_id, MemberStatus::Left, Capabilities::none());
        }
        Ok(())
    }

    async fn pin_message(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
        silent: bool,
    ) -> Result<(), ApiError> {
        self.record(Call::Pin(message_id, silent));
        self.fail("pinChatMessage")?;
        let mut state = self.state.write().unwrap();
        if state.pinned == Some(message_id) {
            return Err(ApiError::reported(400, "Bad Request: CHAT_NOT_MODIFIED"));
        }
        state.pinned = Some(message_id);
        Ok(())
    }

    async fn unpin_message(&self, _chat_id: ChatId) -> Result<(), ApiError> {
        self.record(Call::Unpin);
        self.fail("unpinChatMessage")?;
        let mut state = self.state.write().unwrap();
        if state.pinned.take().is_none() {
            return Err(ApiError::reported(400, "Bad Request: message to unpin not found"));
        }
        Ok(())
    }

    async fn get_or_create_invite_link(&self, _chat_id: ChatId) -> Result<String, ApiError> {
        self.record(Call::ExportInvite);
        self.fail("exportChatInviteLink")?;
        let mut state = self.state.write().unwrap();
        Ok(state
            .invite_link
            .get_or_insert_with(|| "https://t.me/+mockLink".to_string())
            .clone())
    }
}

#[async_trait]
impl Messenger for MockChatApi {
    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), ApiError> {
        self.fail("sendMessage")?;
        self.state.write().unwrap().sent.push(SentMessage {
            chat_id,
            text: html.to_string(),
            reply_to,
        });
        Ok(())
    }

    async fn send_sticker(&self, chat_id: ChatId, sticker: &str) -> Result<(), ApiError> {
        self.fail("sendSticker")?;
        self.state
            .write()
            .unwrap()
            .stickers
            .push((chat_id, sticker.to_string()));
        Ok(())
    }
}

// MOCK UPDATE SOURCE

/// Serves queued batches, then empty ones.
#[derive(Default)]
pub struct MockUpdateSource {
    pub batches: RwLock<VecDeque<Vec<Update>>>,
    pub offsets: RwLock<Vec<Option<i64>>>,
}

#[allow(dead_code)]
impl MockUpdateSource {
    pub fn new(batches: Vec<Vec<Update>>) -> Self {
        Self {
            batches: RwLock::new(batches.into()),
            offsets: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UpdateSource for MockUpdateSource {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        _timeout: Duration,
    ) -> anyhow::Result<Vec<Update>> {
        self.offsets.write().unwrap().push(offset);
        Ok(self.batches.write().unwrap().pop_front().unwrap_or_default())
    }
}
