//! Compact ban durations such as `10m`, `2h` or `3d`.

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;

/// Longest accepted duration. Longer restrictions are passed to the remote
/// side as permanent, so they are refused instead.
pub const MAX_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DurationError {
    #[error("`{token}` is not a valid time. Use a number followed by m, h or d, e.g. 10m.")]
    Malformed { token: String },

    #[error("Invalid time type specified. Expected m, h or d, got: `{unit}`.")]
    UnknownUnit { token: String, unit: char },

    #[error("`{token}` is too short. The time must be greater than zero.")]
    NonPositive { token: String },

    #[error("`{token}` is too long. The time can be at most 366 days.")]
    OutOfRange { token: String },
}

impl DurationError {
    pub fn token(&self) -> &str {
        match self {
            DurationError::Malformed { token }
            | DurationError::UnknownUnit { token, .. }
            | DurationError::NonPositive { token }
            | DurationError::OutOfRange { token } => token,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'm' => Some(TimeUnit::Minutes),
            'h' => Some(TimeUnit::Hours),
            'd' => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn minutes(&self) -> i64 {
        match self {
            TimeUnit::Minutes => 1,
            TimeUnit::Hours => 60,
            TimeUnit::Days => 24 * 60,
        }
    }
}

/// Parses `token` into a length of time.
pub fn parse_delta(token: &str) -> Result<TimeDelta, DurationError> {
    let malformed = || DurationError::Malformed {
        token: token.to_string(),
    };

    let mut chars = token.chars();
    let unit_char = chars.next_back().ok_or_else(malformed)?;
    let digits = chars.as_str();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }

    let unit = TimeUnit::from_char(unit_char).ok_or_else(|| DurationError::UnknownUnit {
        token: token.to_string(),
        unit: unit_char,
    })?;

    let out_of_range = || DurationError::OutOfRange {
        token: token.to_string(),
    };
    let value: i64 = digits.parse().map_err(|_| out_of_range())?;

    if value <= 0 {
        return Err(DurationError::NonPositive {
            token: token.to_string(),
        });
    }

    let minutes = value.checked_mul(unit.minutes()).ok_or_else(out_of_range)?;
    if minutes > MAX_MINUTES {
        return Err(out_of_range());
    }

    Ok(TimeDelta::minutes(minutes))
}

/// Parses `token` into an absolute expiry measured from `relative_to`.
pub fn parse(token: &str, relative_to: DateTime<Utc>) -> Result<DateTime<Utc>, DurationError> {
    let delta = parse_delta(token)?;
    relative_to
        .checked_add_signed(delta)
        .ok_or_else(|| DurationError::OutOfRange {
            token: token.to_string(),
        })
}
