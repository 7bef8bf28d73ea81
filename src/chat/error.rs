#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error {code}: {description}")]
    Reported {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("Unexpected API response: {message}")]
    UnexpectedResponse { message: String },

    /// The ban half of a kick went through but lifting it failed.
    #[error("Member removed but the ban could not be lifted: {0}")]
    KickIncomplete(#[source] Box<ApiError>),
}

/// Remote responses meaning the requested end state already held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOpKind {
    ChatNotModified,
    NothingPinned,
}

/// How a failed remote call should be treated by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    BenignNoOp(NoOpKind),
    /// The remote side understood and refused the request.
    Reported,
    /// Transport, decoding or response-shape failure.
    Fatal,
}

const NOT_MODIFIED: &[&str] = &["chat_not_modified", "chat not modified", "message is not modified"];
const NOTHING_PINNED: &[&str] = &["message to unpin not found", "no pinned message"];
const NOT_FOUND: &[&str] = &["user not found", "member not found", "participant_id_invalid"];
const REPLY_MISSING: &[&str] = &["reply message not found", "message to be replied not found"];

impl ApiError {
    pub fn reported(code: i64, description: impl Into<String>) -> Self {
        ApiError::Reported {
            code,
            description: description.into(),
            retry_after: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ApiError::Reported { description, .. } => Some(description),
            _ => None,
        }
    }

    pub fn classify(&self) -> FailureClass {
        match self {
            ApiError::Reported { .. } => {
                if self.matches(NOT_MODIFIED) {
                    FailureClass::BenignNoOp(NoOpKind::ChatNotModified)
                } else if self.matches(NOTHING_PINNED) {
                    FailureClass::BenignNoOp(NoOpKind::NothingPinned)
                } else {
                    FailureClass::Reported
                }
            }
            _ => FailureClass::Fatal,
        }
    }

    /// The remote side does not know the user in this chat.
    pub fn is_not_found(&self) -> bool {
        self.matches(NOT_FOUND)
    }

    /// A quoted reply failed because the quoted message is gone.
    pub fn is_reply_missing(&self) -> bool {
        self.matches(REPLY_MISSING)
    }

    fn matches(&self, needles: &[&str]) -> bool {
        let Some(description) = self.description() else {
            return false;
        };
        let description = description.to_lowercase();
        needles.iter().any(|n| description.contains(n))
    }
}

impl From<wreq::Error> for ApiError {
    fn from(e: wreq::Error) -> Self {
        ApiError::Request(Box::new(e))
    }
}
