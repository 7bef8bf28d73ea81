use crate::chat::error::ApiError;
use crate::moderation::duration::DurationError;
use crate::moderation::gate::DenyReason;
use crate::moderation::outcome::ModerationOutcome;

/// Action-specific preconditions checked against the target's current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("How am I meant to promote someone that's already an admin?")]
    AlreadyAdmin,

    #[error("This person CREATED the chat, how would I demote them?")]
    CreatorImmutable,

    #[error("Can't demote what wasn't promoted!")]
    NotAdmin,

    #[error("I wish I could... but you're an admin. Demote yourself first.")]
    ActorIsAdmin,

    #[error("I can only fetch invite links for supergroups and channels, sorry!")]
    InviteNeedsSupergroup,
}

/// Everything that can stop a moderation command.
///
/// The `Display` text is the notice shown to the actor.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ModerationError {
    #[error("This command can only be used in groups.")]
    GroupOnly,

    #[error("You don't seem to be referring to a user.")]
    NoTarget,

    #[error("I can't seem to find this user.")]
    UserNotFound,

    #[error("You haven't specified a time to ban this user for!")]
    MissingDuration,

    #[error(transparent)]
    InvalidDuration(#[from] DurationError),

    #[error(transparent)]
    Denied(#[from] DenyReason),

    #[error(transparent)]
    Precondition(#[from] Precondition),

    #[error("Damn, I can't {action}.")]
    RemoteFailure { action: &'static str, message: String },

    /// The user was removed but stays banned. Carries the ban that took effect.
    #[error("I removed that user, but couldn't lift the ban. They are still banned.")]
    KickIncomplete {
        banned: Box<ModerationOutcome>,
        #[source]
        source: ApiError,
    },

    #[error("Remote API failure: {0}")]
    Fatal(#[source] ApiError),
}

/// Error class, mirroring how the transport must react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad command input. No remote call was made.
    Input,
    /// Denied by the gate or a precondition. No remote mutation was made.
    Authorization,
    /// The remote side refused the mutation.
    RemoteFailure,
    /// Must be propagated to the transport.
    Fatal,
}

impl ModerationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ModerationError::GroupOnly
            | ModerationError::NoTarget
            | ModerationError::UserNotFound
            | ModerationError::MissingDuration
            | ModerationError::InvalidDuration(_) => ErrorClass::Input,
            ModerationError::Denied(_) | ModerationError::Precondition(_) => {
                ErrorClass::Authorization
            }
            ModerationError::RemoteFailure { .. } | ModerationError::KickIncomplete { .. } => {
                ErrorClass::RemoteFailure
            }
            ModerationError::Fatal(_) => ErrorClass::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// A state change the remote side applied despite the error.
    pub fn applied_outcome(&self) -> Option<&ModerationOutcome> {
        match self {
            ModerationError::KickIncomplete { banned, .. } => Some(banned),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Capability;

    #[test]
    fn test_notices() {
        assert_eq!(
            ModerationError::NoTarget.to_string(),
            "You don't seem to be referring to a user."
        );
        assert_eq!(
            ModerationError::from(DenyReason::BotLacksCapability(Capability::PinMessages))
                .to_string(),
            "I can't do that without the right to pin messages."
        );
        assert_eq!(
            ModerationError::RemoteFailure {
                action: "ban that user",
                message: "Bad Request: not enough rights".to_string(),
            }
            .to_string(),
            "Damn, I can't ban that user."
        );
    }

    #[test]
    fn test_classes() {
        assert_eq!(ModerationError::NoTarget.class(), ErrorClass::Input);
        assert_eq!(
            ModerationError::from(Precondition::AlreadyAdmin).class(),
            ErrorClass::Authorization
        );
        assert!(ModerationError::Fatal(ApiError::UnexpectedResponse {
            message: "empty".to_string()
        })
        .is_fatal());
        assert!(ModerationError::NoTarget.applied_outcome().is_none());
    }
}
