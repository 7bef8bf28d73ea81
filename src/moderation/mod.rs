//! Permission-gated moderation actions.
//!
//! [`Moderator`] is the entry point: it resolves the target, runs the
//! [`gate`], performs one remote mutation through [`ChatApi`] and returns a
//! [`ModerationOutcome`]. [`audit`] turns outcomes into log records.
//!
//! [`ChatApi`]: crate::chat::ChatApi

pub mod audit;
pub mod duration;
pub mod error;
pub mod gate;
pub mod moderator;
pub mod outcome;
pub mod resolver;

pub use error::ModerationError;
pub use moderator::AdminList;
pub use moderator::Invocation;
pub use moderator::Moderator;
pub use outcome::ModerationOutcome;
pub use outcome::OutcomeKind;
