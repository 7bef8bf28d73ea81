//! Audit records for completed privileged actions.
//!
//! A record is built only from a [`ModerationOutcome`], which in turn exists
//! only for confirmed actions. Delivering the record is the job of whoever
//! subscribes to it.

use std::fmt::Write;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::chat::ChatId;
use crate::chat::User;
use crate::chat::escape_html;
use crate::moderation::outcome::Effect;
use crate::moderation::outcome::ModerationOutcome;
use crate::moderation::outcome::OutcomeKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub kind: OutcomeKind,
    pub chat_id: ChatId,
    pub chat_title: String,
    pub admin: User,
    pub target: Option<User>,
    pub duration: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    /// The remote side reported the end state already held.
    pub no_op: bool,
}

impl Record {
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Renders the record for a Telegram HTML message.
    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<b>{}:</b>\n{}\n<b>Admin:</b> {}",
            escape_html(&self.chat_title),
            self.tag(),
            self.admin.mention_html()
        );
        // Writing into a String cannot fail.
        if let Some(target) = &self.target {
            let _ = write!(out, "\n<b>User:</b> {}", target.mention_html());
        }
        if let Some(duration) = &self.duration {
            let _ = write!(out, "\n<b>Time:</b> {}", escape_html(duration));
        }
        if let Some(reason) = &self.reason {
            let _ = write!(out, "\n<b>Reason:</b> {}", escape_html(reason));
        }
        if self.no_op {
            out.push_str("\n<i>No change was needed.</i>");
        }
        out
    }
}

/// Builds the record for an outcome.
pub fn emit(outcome: &ModerationOutcome) -> Record {
    Record {
        kind: outcome.kind,
        chat_id: outcome.chat.id,
        chat_title: outcome.chat.display_title().to_string(),
        admin: outcome.actor.clone(),
        target: outcome.target.clone(),
        duration: outcome.extra.duration.clone(),
        expires_at: outcome.extra.expires_at,
        reason: outcome.extra.reason.clone(),
        no_op: matches!(outcome.effect, Effect::AlreadyInPlace(_)),
    }
}

/// Builds a record only for outcomes that are audited.
pub fn record_for(outcome: &ModerationOutcome) -> Option<Record> {
    outcome.is_audited().then(|| emit(outcome))
}
