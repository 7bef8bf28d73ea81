//! Reverse lookup from @-handles to numeric identities.
//!
//! The Bot API cannot resolve a username on its own, so handles are learned
//! from the messages the bot sees. A user who never interacted with the bot
//! cannot be resolved.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::chat::User;
use crate::chat::UserId;

pub const DEFAULT_DIRECTORY_CAPACITY: u64 = 10_000;

pub trait UserDirectory: Send + Sync {
    /// Accepts the handle with or without the leading `@`, case-insensitively.
    fn lookup(&self, username: &str) -> Option<UserId>;

    fn remember(&self, user: &User);
}

/// Keeps at most `capacity` handles, forgetting the least recently used.
pub struct InMemoryUserDirectory {
    users: Cache<String, UserId>,
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DIRECTORY_CAPACITY)
    }
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            users: Cache::builder()
                .max_capacity(capacity.max(1))
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    /// Number of remembered handles, after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.users.run_pending_tasks();
        self.users.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn normalize(username: &str) -> String {
        username.trim_start_matches('@').to_lowercase()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn lookup(&self, username: &str) -> Option<UserId> {
        let key = Self::normalize(username);
        if key.is_empty() {
            return None;
        }
        self.users.get(&key)
    }

    fn remember(&self, user: &User) {
        if let Some(username) = &user.username {
            self.users.insert(Self::normalize(username), user.id);
        }
    }
}
