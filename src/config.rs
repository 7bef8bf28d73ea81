//! Runtime configuration read from the environment.
//!
//! `.env` is loaded by the binary before [`Config::load`] runs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chat::ChatId;
use crate::chat::directory::DEFAULT_DIRECTORY_CAPACITY;
use crate::error::AppError;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT: u64 = 30;
const DEFAULT_PREFIXES: &str = "/!";

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub api_url: String,
    /// Chat that receives audit records. Auditing is off when unset.
    pub log_channel_id: Option<ChatId>,
    /// Sticker file id sent after a successful ban or kick.
    pub ban_sticker: Option<String>,
    pub poll_timeout: Duration,
    pub logs_path: PathBuf,
    /// Each character is an accepted command prefix.
    pub command_prefixes: String,
    /// Most @-handles remembered for target resolution.
    pub directory_capacity: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            bot_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            log_channel_id: None,
            ban_sticker: None,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT),
            logs_path: PathBuf::from("logs"),
            command_prefixes: DEFAULT_PREFIXES.to_string(),
            directory_capacity: DEFAULT_DIRECTORY_CAPACITY,
        }
    }

    pub fn load(&mut self) -> Result<(), AppError> {
        self.bot_token = required("BOT_TOKEN")?;
        if let Some(url) = optional("API_URL") {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        self.log_channel_id = parsed::<i64>("LOG_CHANNEL_ID")?.map(ChatId);
        self.ban_sticker = optional("BAN_STICKER");
        if let Some(secs) = parsed::<u64>("POLL_TIMEOUT")? {
            self.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = optional("LOGS_PATH") {
            self.logs_path = PathBuf::from(path);
        }
        if let Some(prefixes) = optional("COMMAND_PREFIXES") {
            self.command_prefixes = prefixes;
        }
        if let Some(capacity) = parsed::<u64>("USER_DIRECTORY_CAPACITY")? {
            self.directory_capacity = capacity;
        }
        Ok(())
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String, AppError> {
    optional(key).ok_or_else(|| AppError::MissingConfig {
        key: key.to_string(),
    })
}

fn parsed<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    optional(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| AppError::InvalidConfig {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}
