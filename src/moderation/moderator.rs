//! Moderation action executor.
//!
//! Every action follows the same sequence: validate local input, evaluate the
//! gate against fresh member snapshots, check the target's current state,
//! then issue exactly one remote mutation and classify its result. Nothing is
//! retried and no lock is held across remote calls.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::chat::Capabilities;
use crate::chat::Capability;
use crate::chat::Chat;
use crate::chat::ChatApi;
use crate::chat::ChatId;
use crate::chat::ChatType;
use crate::chat::Member;
use crate::chat::MemberStatus;
use crate::chat::MessageRef;
use crate::chat::User;
use crate::chat::UserDirectory;
use crate::chat::UserId;
use crate::chat::error::ApiError;
use crate::chat::error::FailureClass;
use crate::chat::escape_html;
use crate::moderation::duration;
use crate::moderation::error::ModerationError;
use crate::moderation::error::Precondition;
use crate::moderation::gate;
use crate::moderation::gate::GateInput;
use crate::moderation::gate::Requirements;
use crate::moderation::outcome::Effect;
use crate::moderation::outcome::ModerationOutcome;
use crate::moderation::outcome::OutcomeKind;
use crate::moderation::resolver;

/// Trailing tokens on `pin` that request a visible notification.
const LOUD_PIN_TOKENS: [&str; 3] = ["notify", "loud", "violent"];

/// One command invocation as delivered by the transport.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub actor: User,
    pub chat: Chat,
    pub replied: Option<MessageRef>,
    pub args: Vec<String>,
}

/// Member snapshots that passed the gate.
struct Authorized {
    bot: Member,
    actor: Member,
}

/// Administrators of a chat, for the `adminlist` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminList {
    pub chat_title: String,
    pub admins: Vec<User>,
}

impl AdminList {
    pub fn to_html(&self) -> String {
        let mut text = format!("Admins in <b>{}</b>:", escape_html(&self.chat_title));
        for admin in &self.admins {
            let name = match &admin.username {
                Some(username) => format!("@{}", escape_html(username)),
                None => format!(
                    "<a href=\"tg://user?id={}\">{}</a>",
                    admin.id,
                    escape_html(&admin.full_name())
                ),
            };
            text.push_str("\n - ");
            text.push_str(&name);
        }
        text
    }
}

pub struct Moderator {
    api: Arc<dyn ChatApi>,
    directory: Arc<dyn UserDirectory>,
    bot: User,
    clock: fn() -> DateTime<Utc>,
}

impl Moderator {
    pub fn new(api: Arc<dyn ChatApi>, directory: Arc<dyn UserDirectory>, bot: User) -> Self {
        Self {
            api,
            directory,
            bot,
            clock: Utc::now,
        }
    }

    /// Replaces the time source used for temporary ban expiries.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn bot(&self) -> &User {
        &self.bot
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub async fn promote(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let target_id = self.resolve(inv)?.0;
        let auth = self
            .authorize(inv, Requirements::admin(Some(Capability::PromoteMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::target_is_not_bot(&target, self.bot.id).into_result()?;
        if target.is_admin() {
            return Err(Precondition::AlreadyAdmin.into());
        }

        // A promoted admin never receives more than the bot itself holds.
        let granted = auth.bot.effective_capabilities();
        let effect = self.apply(
            "promote that user",
            self.api
                .set_member_capabilities(inv.chat.id, target_id, granted)
                .await,
        )?;

        info!(
            "Promoted user {} in chat {} by {}",
            target_id, inv.chat.id, inv.actor.id
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Promoted, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect)
                .with_granted(granted),
        )
    }

    pub async fn demote(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let target_id = self.resolve(inv)?.0;
        self.authorize(inv, Requirements::admin(Some(Capability::PromoteMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::target_is_not_bot(&target, self.bot.id).into_result()?;
        if target.is_creator() {
            return Err(Precondition::CreatorImmutable.into());
        }
        if !target.is_admin() {
            return Err(Precondition::NotAdmin.into());
        }

        let effect = self.apply(
            "demote that user",
            self.api
                .set_member_capabilities(inv.chat.id, target_id, Capabilities::none())
                .await,
        )?;

        info!(
            "Demoted user {} in chat {} by {}",
            target_id, inv.chat.id, inv.actor.id
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Demoted, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect),
        )
    }

    pub async fn ban(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let (target_id, reason) = self.resolve(inv)?;
        self.authorize(inv, Requirements::admin(Some(Capability::RestrictMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::check_target(
            &[gate::target_is_not_bot, gate::target_not_protected],
            &target,
            self.bot.id,
        )
        .into_result()?;

        let effect = self.apply(
            "ban that user",
            self.api.remove_member(inv.chat.id, target_id, None).await,
        )?;

        info!(
            "Banned user {} in chat {} by {}",
            target_id, inv.chat.id, inv.actor.id
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Banned, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect)
                .with_reason(reason),
        )
    }

    pub async fn temp_ban(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let (target_id, remainder) = self.resolve(inv)?;

        let remainder = remainder.ok_or(ModerationError::MissingDuration)?;
        let (token, reason) = match remainder.split_once(' ') {
            Some((token, reason)) => (token.to_string(), Some(reason.trim().to_string())),
            None => (remainder, None),
        };
        let expires_at = duration::parse(&token, (self.clock)())?;

        self.authorize(inv, Requirements::admin(Some(Capability::RestrictMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::check_target(
            &[gate::target_is_not_bot, gate::target_not_protected],
            &target,
            self.bot.id,
        )
        .into_result()?;

        let effect = self.apply(
            "ban that user",
            self.api
                .remove_member(inv.chat.id, target_id, Some(expires_at))
                .await,
        )?;

        info!(
            "Temporarily banned user {} in chat {} by {} until {}",
            target_id, inv.chat.id, inv.actor.id, expires_at
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::TempBanned, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect)
                .with_expiry(token.to_lowercase(), expires_at)
                .with_reason(reason.filter(|r| !r.is_empty())),
        )
    }

    pub async fn kick(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let (target_id, reason) = self.resolve(inv)?;
        self.authorize(inv, Requirements::admin(Some(Capability::RestrictMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::check_target(
            &[
                gate::target_is_not_bot,
                gate::target_not_protected,
                gate::target_is_member,
            ],
            &target,
            self.bot.id,
        )
        .into_result()?;

        let effect = self.apply_kick(
            "kick that user",
            inv,
            &target.user,
            reason.clone(),
            self.api.kick_member(inv.chat.id, target_id).await,
        )?;

        info!(
            "Kicked user {} from chat {} by {}",
            target_id, inv.chat.id, inv.actor.id
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Kicked, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect)
                .with_reason(reason),
        )
    }

    /// Removes the actor from the chat at their own request.
    pub async fn kick_me(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let auth = self
            .authorize(
                inv,
                Requirements::self_service(Some(Capability::RestrictMembers)),
            )
            .await?;

        if auth.actor.is_admin() {
            return Err(Precondition::ActorIsAdmin.into());
        }

        let effect = self.apply_kick(
            "remove you from this chat",
            inv,
            &inv.actor,
            None,
            self.api.kick_member(inv.chat.id, inv.actor.id).await,
        )?;

        info!("User {} left chat {} via kickme", inv.actor.id, inv.chat.id);
        Ok(
            ModerationOutcome::new(OutcomeKind::Kicked, inv.actor.clone(), inv.chat.clone())
                .with_target(inv.actor.clone())
                .with_effect(effect),
        )
    }

    pub async fn unban(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let (target_id, reason) = self.resolve(inv)?;
        self.authorize(inv, Requirements::admin(Some(Capability::RestrictMembers)))
            .await?;

        let target = self.fetch_target(inv.chat.id, target_id).await?;
        gate::check_target(
            &[gate::target_is_not_bot, gate::target_not_member],
            &target,
            self.bot.id,
        )
        .into_result()?;

        let effect = self.apply(
            "unban that user",
            self.api.restore_member(inv.chat.id, target_id).await,
        )?;

        info!(
            "Unbanned user {} in chat {} by {}",
            target_id, inv.chat.id, inv.actor.id
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Unbanned, inv.actor.clone(), inv.chat.clone())
                .with_target(target.user)
                .with_effect(effect)
                .with_reason(reason),
        )
    }

    /// Pins the replied-to message. Silent unless `notify`/`loud` is given.
    pub async fn pin(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let Some(message) = &inv.replied else {
            debug!("Nothing to pin in chat {}", inv.chat.id);
            return Ok(ModerationOutcome::no_op(inv.actor.clone(), inv.chat.clone()));
        };

        let silent = !inv
            .args
            .first()
            .is_some_and(|arg| LOUD_PIN_TOKENS.contains(&arg.to_lowercase().as_str()));

        self.authorize(inv, Requirements::admin(Some(Capability::PinMessages)))
            .await?;

        let effect = self.apply(
            "pin that message",
            self.api.pin_message(inv.chat.id, message.id, silent).await,
        )?;

        info!(
            "Pinned message {} in chat {} by {} (silent: {})",
            message.id, inv.chat.id, inv.actor.id, silent
        );
        Ok(
            ModerationOutcome::new(OutcomeKind::Pinned, inv.actor.clone(), inv.chat.clone())
                .with_effect(effect),
        )
    }

    pub async fn unpin(&self, inv: &Invocation) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        self.authorize(inv, Requirements::admin(Some(Capability::PinMessages)))
            .await?;

        let effect = self.apply(
            "unpin that message",
            self.api.unpin_message(inv.chat.id).await,
        )?;

        info!("Unpinned message in chat {} by {}", inv.chat.id, inv.actor.id);
        Ok(
            ModerationOutcome::new(OutcomeKind::Unpinned, inv.actor.clone(), inv.chat.clone())
                .with_effect(effect),
        )
    }

    /// Returns the chat's public handle, or an exported invite link.
    pub async fn invite_link(
        &self,
        inv: &Invocation,
    ) -> Result<ModerationOutcome, ModerationError> {
        require_group(&inv.chat)?;
        let auth = self.authorize(inv, Requirements::admin(None)).await?;
        let outcome =
            ModerationOutcome::new(OutcomeKind::InviteLink, inv.actor.clone(), inv.chat.clone());

        if let Some(handle) = inv.chat.username.as_deref().filter(|h| !h.is_empty()) {
            return Ok(outcome.with_invite_link(format!("@{handle}")));
        }

        if inv.chat.kind != ChatType::Supergroup {
            return Err(Precondition::InviteNeedsSupergroup.into());
        }

        let input = GateInput {
            bot: &auth.bot,
            actor: &auth.actor,
        };
        gate::bot_has_capability(&input, &Requirements::admin(Some(Capability::InviteUsers)))
            .into_result()?;

        let link = self
            .api
            .get_or_create_invite_link(inv.chat.id)
            .await
            .map_err(|e| remote_error("export an invite link", e))?;

        Ok(outcome.with_invite_link(link))
    }

    pub async fn admin_list(&self, chat: &Chat) -> Result<AdminList, ModerationError> {
        let admins = self
            .api
            .get_administrators(chat.id)
            .await
            .map_err(|e| remote_error("fetch the admins of this chat", e))?;

        Ok(AdminList {
            chat_title: chat.display_title().to_string(),
            admins: admins.into_iter().map(|m| m.user).collect(),
        })
    }

    /// Live admin status of a user, for the chat settings summary.
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, ModerationError> {
        let member = self
            .api
            .get_member(chat_id, user_id)
            .await
            .map_err(|e| remote_error("check your admin status", e))?;
        Ok(member.is_some_and(|m| m.is_admin()))
    }

    fn resolve(&self, inv: &Invocation) -> Result<(UserId, Option<String>), ModerationError> {
        let resolution =
            resolver::resolve(&inv.args, inv.replied.as_ref(), self.directory.as_ref());
        match resolution.target {
            Some(target) => Ok((target, resolution.remainder)),
            None => Err(ModerationError::NoTarget),
        }
    }

    async fn authorize(
        &self,
        inv: &Invocation,
        requirements: Requirements,
    ) -> Result<Authorized, ModerationError> {
        let (bot, actor) = tokio::try_join!(
            self.api.get_member(inv.chat.id, self.bot.id),
            self.api.get_member(inv.chat.id, inv.actor.id),
        )
        .map_err(|e| remote_error("check permissions in this chat", e))?;

        let bot = bot.unwrap_or_else(|| Member::new(self.bot.clone(), MemberStatus::Left));
        let actor = actor.unwrap_or_else(|| Member::new(inv.actor.clone(), MemberStatus::Left));

        let decision = gate::check(
            &GateInput {
                bot: &bot,
                actor: &actor,
            },
            &requirements,
        );
        if let Err(reason) = decision.into_result() {
            debug!(
                "Denied user {} in chat {}: {:?}",
                inv.actor.id, inv.chat.id, reason
            );
            return Err(ModerationError::Denied(reason));
        }

        Ok(Authorized { bot, actor })
    }

    /// Fresh read of the target's membership. Never reused across commands.
    async fn fetch_target(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Member, ModerationError> {
        match self.api.get_member(chat_id, user_id).await {
            Ok(Some(member)) => Ok(member),
            Ok(None) => Err(ModerationError::UserNotFound),
            Err(e) if e.is_not_found() => Err(ModerationError::UserNotFound),
            Err(e) => Err(remote_error("look up that user", e)),
        }
    }

    fn apply(
        &self,
        action: &'static str,
        result: Result<(), ApiError>,
    ) -> Result<Effect, ModerationError> {
        match result {
            Ok(()) => Ok(Effect::Applied),
            Err(e) => match e.classify() {
                FailureClass::BenignNoOp(kind) => {
                    debug!("Remote reported {action} as a no-op: {e}");
                    Ok(Effect::AlreadyInPlace(kind))
                }
                _ => Err(remote_error(action, e)),
            },
        }
    }

    /// Like [`Self::apply`], but a kick that stopped after its ban reports
    /// the ban that stayed in place.
    fn apply_kick(
        &self,
        action: &'static str,
        inv: &Invocation,
        target: &User,
        reason: Option<String>,
        result: Result<(), ApiError>,
    ) -> Result<Effect, ModerationError> {
        match result {
            Err(ApiError::KickIncomplete(source)) => {
                error!(
                    "Kick of user {} in chat {} stopped after the ban, user remains banned: {}",
                    target.id, inv.chat.id, source
                );
                let banned =
                    ModerationOutcome::new(OutcomeKind::Banned, inv.actor.clone(), inv.chat.clone())
                        .with_target(target.clone())
                        .with_reason(reason);
                Err(ModerationError::KickIncomplete {
                    banned: Box::new(banned),
                    source: *source,
                })
            }
            result => self.apply(action, result),
        }
    }
}

pub(crate) fn require_group(chat: &Chat) -> Result<(), ModerationError> {
    if chat.kind.is_group_like() {
        Ok(())
    } else {
        Err(ModerationError::GroupOnly)
    }
}

fn remote_error(action: &'static str, e: ApiError) -> ModerationError {
    match e.classify() {
        FailureClass::Fatal => ModerationError::Fatal(e),
        _ => {
            warn!("Remote refused to {action}: {e}");
            ModerationError::RemoteFailure {
                action,
                message: e.to_string(),
            }
        }
    }
}
