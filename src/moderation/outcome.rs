use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::chat::Capabilities;
use crate::chat::Chat;
use crate::chat::User;
use crate::chat::error::NoOpKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    Promoted,
    Demoted,
    Banned,
    TempBanned,
    Kicked,
    Unbanned,
    Pinned,
    Unpinned,
    InviteLink,
    NoOp,
}

impl OutcomeKind {
    /// Tag line used in audit records.
    pub fn tag(&self) -> &'static str {
        match self {
            OutcomeKind::Promoted => "#PROMOTED",
            OutcomeKind::Demoted => "#DEMOTED",
            OutcomeKind::Banned => "#BANNED",
            OutcomeKind::TempBanned => "#TEMP_BANNED",
            OutcomeKind::Kicked => "#KICKED",
            OutcomeKind::Unbanned => "#UNBANNED",
            OutcomeKind::Pinned => "#PINNED",
            OutcomeKind::Unpinned => "#UNPINNED",
            OutcomeKind::InviteLink => "#INVITE_LINK",
            OutcomeKind::NoOp => "#NOOP",
        }
    }

    /// Privileged state changes that produce an audit record.
    pub fn is_audited(&self) -> bool {
        !matches!(self, OutcomeKind::InviteLink | OutcomeKind::NoOp)
    }
}

/// Whether the remote side actually changed anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    Applied,
    AlreadyInPlace(NoOpKind),
}

/// Action-specific payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeExtra {
    pub reason: Option<String>,
    /// The duration token as the admin typed it, e.g. `2h`.
    pub duration: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub invite_link: Option<String>,
    pub granted: Option<Capabilities>,
}

/// Result of one executed action. Only produced once the remote mutation is
/// confirmed or reported as a benign no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub kind: OutcomeKind,
    pub actor: User,
    pub target: Option<User>,
    pub chat: Chat,
    pub effect: Effect,
    pub extra: OutcomeExtra,
}

impl ModerationOutcome {
    pub fn new(kind: OutcomeKind, actor: User, chat: Chat) -> Self {
        Self {
            kind,
            actor,
            target: None,
            chat,
            effect: Effect::Applied,
            extra: OutcomeExtra::default(),
        }
    }

    pub fn no_op(actor: User, chat: Chat) -> Self {
        Self::new(OutcomeKind::NoOp, actor, chat)
    }

    pub fn with_target(mut self, target: User) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.extra.reason = reason;
        self
    }

    pub fn with_expiry(mut self, duration: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        self.extra.duration = Some(duration.into());
        self.extra.expires_at = Some(expires_at);
        self
    }

    pub fn with_invite_link(mut self, link: impl Into<String>) -> Self {
        self.extra.invite_link = Some(link.into());
        self
    }

    pub fn with_granted(mut self, granted: Capabilities) -> Self {
        self.extra.granted = Some(granted);
        self
    }

    /// Actions a member performs on themselves, such as leaving via kickme.
    pub fn is_self_service(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.id == self.actor.id)
    }

    pub fn is_audited(&self) -> bool {
        self.kind.is_audited() && !self.is_self_service()
    }

    /// Text shown to the actor. `None` for silent no-ops.
    pub fn reply_text(&self) -> Option<String> {
        let text = match self.kind {
            OutcomeKind::Promoted => "Successfully promoted!".to_string(),
            OutcomeKind::Demoted => "Successfully demoted!".to_string(),
            OutcomeKind::Banned => "Banned!".to_string(),
            OutcomeKind::TempBanned => format!(
                "Banned! User will be banned for {}.",
                self.extra.duration.as_deref().unwrap_or("a while")
            ),
            OutcomeKind::Kicked if self.is_self_service() => "No problem.".to_string(),
            OutcomeKind::Kicked => "Kicked!".to_string(),
            OutcomeKind::Unbanned => "Yep, this user can join!".to_string(),
            OutcomeKind::Pinned => "Pinned!".to_string(),
            OutcomeKind::Unpinned => "Unpinned!".to_string(),
            OutcomeKind::InviteLink => self.extra.invite_link.clone()?,
            OutcomeKind::NoOp => return None,
        };
        Some(text)
    }
}
