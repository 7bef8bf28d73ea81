//! Authorization predicates evaluated before any privileged remote mutation.
//!
//! Predicates are pure functions over already-fetched member snapshots. The
//! chain order is fixed: later predicates assume the earlier ones permitted.

use crate::chat::Capability;
use crate::chat::Member;
use crate::chat::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("You need to be an admin of this chat to do this.")]
    ActorNotAdmin,

    #[error("I'm not an admin here! Make me an admin first.")]
    BotNotAdmin,

    #[error("I can't do that without the right to {}.", .0.describe())]
    BotLacksCapability(Capability),

    #[error("I really wish I could do that to admins...")]
    TargetProtected,

    #[error("I'm not going to do that to myself, are you crazy?")]
    TargetIsBot,

    #[error("Why are you trying to unban someone who is already in the chat?")]
    TargetAlreadyMember,

    #[error("This user isn't in the chat.")]
    TargetNotMember,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_permit(&self) -> bool {
        matches!(self, Decision::Permit)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Permit => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorRequirement {
    Admin,
    /// Self-service commands any member may issue.
    Anyone,
}

/// What an action needs from the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirements {
    pub capability: Option<Capability>,
    pub actor: ActorRequirement,
}

impl Requirements {
    pub const fn admin(capability: Option<Capability>) -> Self {
        Self {
            capability,
            actor: ActorRequirement::Admin,
        }
    }

    pub const fn self_service(capability: Option<Capability>) -> Self {
        Self {
            capability,
            actor: ActorRequirement::Anyone,
        }
    }
}

/// Snapshots the gate is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct GateInput<'a> {
    pub bot: &'a Member,
    pub actor: &'a Member,
}

pub type Predicate = fn(&GateInput<'_>, &Requirements) -> Decision;

pub type TargetPredicate = fn(&Member, UserId) -> Decision;

/// The gate, in evaluation order.
pub const CHAIN: [Predicate; 3] = [bot_is_admin, bot_has_capability, actor_is_admin];

/// Runs [`CHAIN`], returning the first denial.
pub fn check(input: &GateInput<'_>, requirements: &Requirements) -> Decision {
    first_deny(CHAIN.iter().map(|predicate| predicate(input, requirements)))
}

/// Runs target predicates in the given order, returning the first denial.
pub fn check_target(predicates: &[TargetPredicate], target: &Member, bot_id: UserId) -> Decision {
    first_deny(predicates.iter().map(|predicate| predicate(target, bot_id)))
}

fn first_deny(mut decisions: impl Iterator<Item = Decision>) -> Decision {
    decisions
        .find(|decision| !decision.is_permit())
        .unwrap_or(Decision::Permit)
}

pub fn bot_is_admin(input: &GateInput<'_>, _: &Requirements) -> Decision {
    if input.bot.is_admin() {
        Decision::Permit
    } else {
        Decision::Deny(DenyReason::BotNotAdmin)
    }
}

pub fn bot_has_capability(input: &GateInput<'_>, requirements: &Requirements) -> Decision {
    match requirements.capability {
        Some(cap) if !input.bot.effective_capabilities().contains(cap) => {
            Decision::Deny(DenyReason::BotLacksCapability(cap))
        }
        _ => Decision::Permit,
    }
}

pub fn actor_is_admin(input: &GateInput<'_>, requirements: &Requirements) -> Decision {
    match requirements.actor {
        ActorRequirement::Admin if !input.actor.is_admin() => {
            Decision::Deny(DenyReason::ActorNotAdmin)
        }
        _ => Decision::Permit,
    }
}

/// Admins, the creator and the bot itself are exempt from destructive actions.
pub fn is_protected(target: &Member, bot_id: UserId) -> bool {
    target.is_admin() || target.user.id == bot_id
}

pub fn target_is_not_bot(target: &Member, bot_id: UserId) -> Decision {
    if target.user.id == bot_id {
        Decision::Deny(DenyReason::TargetIsBot)
    } else {
        Decision::Permit
    }
}

pub fn target_not_protected(target: &Member, bot_id: UserId) -> Decision {
    if is_protected(target, bot_id) {
        Decision::Deny(DenyReason::TargetProtected)
    } else {
        Decision::Permit
    }
}

pub fn target_is_member(target: &Member, _: UserId) -> Decision {
    if target.is_in_chat() {
        Decision::Permit
    } else {
        Decision::Deny(DenyReason::TargetNotMember)
    }
}

pub fn target_not_member(target: &Member, _: UserId) -> Decision {
    if target.is_in_chat() {
        Decision::Deny(DenyReason::TargetAlreadyMember)
    } else {
        Decision::Permit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Capabilities;
    use crate::chat::MemberStatus;
    use crate::chat::User;

    const BOT: UserId = UserId(1);

    fn bot(status: MemberStatus, caps: Capabilities) -> Member {
        Member::new(User::new(1, "modgate"), status).with_capabilities(caps)
    }

    fn member(id: i64, status: MemberStatus) -> Member {
        Member::new(User::new(id, "someone"), status)
    }

    #[test]
    fn test_check_permits_admin_with_capability() {
        let bot = bot(
            MemberStatus::Administrator,
            Capabilities::none().with(Capability::RestrictMembers),
        );
        let actor = member(2, MemberStatus::Administrator);
        let input = GateInput {
            bot: &bot,
            actor: &actor,
        };

        let decision = check(&input, &Requirements::admin(Some(Capability::RestrictMembers)));
        assert_eq!(decision, Decision::Permit);
    }

    #[test]
    fn test_bot_not_admin_denies_first() {
        let bot = bot(MemberStatus::Member, Capabilities::none());
        let actor = member(2, MemberStatus::Member);
        let input = GateInput {
            bot: &bot,
            actor: &actor,
        };

        let decision = check(&input, &Requirements::admin(Some(Capability::PinMessages)));
        assert_eq!(decision, Decision::Deny(DenyReason::BotNotAdmin));
    }

    #[test]
    fn test_missing_capability_denies_before_actor_check() {
        let bot = bot(
            MemberStatus::Administrator,
            Capabilities::none().with(Capability::PinMessages),
        );
        let actor = member(2, MemberStatus::Member);
        let input = GateInput {
            bot: &bot,
            actor: &actor,
        };

        let decision = check(&input, &Requirements::admin(Some(Capability::PromoteMembers)));
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::BotLacksCapability(Capability::PromoteMembers))
        );
    }

    #[test]
    fn test_actor_not_admin() {
        let bot = bot(MemberStatus::Administrator, Capabilities::all());
        let actor = member(2, MemberStatus::Member);
        let input = GateInput {
            bot: &bot,
            actor: &actor,
        };

        assert_eq!(
            check(&input, &Requirements::admin(None)),
            Decision::Deny(DenyReason::ActorNotAdmin)
        );
        assert_eq!(
            check(&input, &Requirements::self_service(Some(Capability::RestrictMembers))),
            Decision::Permit
        );
    }

    #[test]
    fn test_creator_bot_holds_every_capability() {
        let bot = bot(MemberStatus::Creator, Capabilities::none());
        let actor = member(2, MemberStatus::Creator);
        let input = GateInput {
            bot: &bot,
            actor: &actor,
        };
        assert!(check(&input, &Requirements::admin(Some(Capability::PromoteMembers))).is_permit());
    }

    #[test]
    fn test_protected_targets() {
        assert!(is_protected(&member(5, MemberStatus::Administrator), BOT));
        assert!(is_protected(&member(5, MemberStatus::Creator), BOT));
        assert!(is_protected(&member(1, MemberStatus::Member), BOT));
        assert!(!is_protected(&member(5, MemberStatus::Member), BOT));
        assert!(!is_protected(&member(5, MemberStatus::Left), BOT));
    }

    #[test]
    fn test_check_target_returns_first_denial() {
        let target = bot(MemberStatus::Administrator, Capabilities::all());
        let decision = check_target(&[target_is_not_bot, target_not_protected], &target, BOT);
        assert_eq!(decision, Decision::Deny(DenyReason::TargetIsBot));

        let target = member(5, MemberStatus::Administrator);
        let decision = check_target(&[target_is_not_bot, target_not_protected], &target, BOT);
        assert_eq!(decision, Decision::Deny(DenyReason::TargetProtected));
    }

    #[test]
    fn test_membership_predicates() {
        let present = member(5, MemberStatus::Member);
        let gone = member(5, MemberStatus::Kicked);

        assert_eq!(
            target_not_member(&present, BOT),
            Decision::Deny(DenyReason::TargetAlreadyMember)
        );
        assert!(target_not_member(&gone, BOT).is_permit());
        assert_eq!(
            target_is_member(&gone, BOT),
            Decision::Deny(DenyReason::TargetNotMember)
        );
        assert!(target_is_member(&present, BOT).is_permit());
    }
}
