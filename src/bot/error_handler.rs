//! Turns command errors into user-facing replies.

use log::error;

use crate::bot::commands::Command;
use crate::bot::response::CommandResponse;
use crate::error::AppError;
use crate::moderation::ModerationError;

pub struct ErrorHandler;

impl ErrorHandler {
    /// Expected failures become their notice. Fatal ones are logged under a
    /// reference id and the user only sees the id.
    pub fn handle(command: Command, error: &ModerationError) -> CommandResponse {
        if !error.is_fatal() {
            return CommandResponse::from_error(error);
        }

        let ref_id = AppError::log_with_ref(error);
        error!("Unexpected error in command `{}`: {:?}", command.name(), error);
        CommandResponse::reply(format!(
            "An unexpected error occurred. Please try again later.\nReference ID: <code>{ref_id}</code>"
        ))
    }
}
