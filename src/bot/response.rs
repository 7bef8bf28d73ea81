use crate::chat::escape_html;
use crate::moderation::ModerationError;
use crate::moderation::ModerationOutcome;
use crate::moderation::OutcomeKind;
use crate::moderation::audit;
use crate::moderation::audit::Record;
use crate::moderation::outcome::Effect;

/// What the transport does after a command ran.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandResponse {
    /// HTML reply to the command message.
    pub reply: Option<String>,
    pub record: Option<Record>,
    /// Whether to send the configured ban sticker.
    pub sticker: bool,
}

impl CommandResponse {
    pub fn reply(html: impl Into<String>) -> Self {
        Self {
            reply: Some(html.into()),
            ..Self::default()
        }
    }

    /// A plain-text notice, escaped for HTML.
    pub fn notice(text: &str) -> Self {
        Self::reply(escape_html(text))
    }

    pub fn from_outcome(outcome: ModerationOutcome) -> Self {
        let removed = matches!(
            outcome.kind,
            OutcomeKind::Banned | OutcomeKind::TempBanned | OutcomeKind::Kicked
        );
        Self {
            reply: outcome.reply_text().map(|text| escape_html(&text)),
            record: audit::record_for(&outcome),
            sticker: removed && !outcome.is_self_service() && outcome.effect == Effect::Applied,
        }
    }

    /// The error notice, plus a record for any change that still took effect.
    pub fn from_error(error: &ModerationError) -> Self {
        Self {
            record: error.applied_outcome().map(audit::emit),
            ..Self::notice(&error.to_string())
        }
    }
}
