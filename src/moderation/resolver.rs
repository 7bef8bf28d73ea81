//! Extracts the target user and trailing text from command input.

use crate::chat::MessageRef;
use crate::chat::UserDirectory;
use crate::chat::UserId;

/// What the resolver pulled out of the command input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub target: Option<UserId>,
    /// Everything after the target, joined by single spaces.
    pub remainder: Option<String>,
}

impl Resolution {
    fn none() -> Self {
        Self::default()
    }

    fn new(target: UserId, rest: &[String]) -> Self {
        Self {
            target: Some(target),
            remainder: join(rest),
        }
    }
}

/// Resolves the target of a command.
///
/// A replied-to message wins over the arguments, in which case every argument
/// is remainder text. Otherwise the first argument must be a numeric identity
/// or a known @-handle. Unresolvable input yields an empty [`Resolution`].
pub fn resolve(
    args: &[String],
    replied: Option<&MessageRef>,
    directory: &dyn UserDirectory,
) -> Resolution {
    if let Some(author) = replied.and_then(|m| m.author.as_ref()) {
        return Resolution::new(author.id, args);
    }

    let Some((first, rest)) = args.split_first() else {
        return Resolution::none();
    };

    match parse_target(first, directory) {
        Some(target) => Resolution::new(target, rest),
        None => Resolution::none(),
    }
}

fn parse_target(token: &str, directory: &dyn UserDirectory) -> Option<UserId> {
    if let Some(handle) = token.strip_prefix('@') {
        return directory.lookup(handle);
    }
    token.parse::<i64>().ok().map(UserId)
}

fn join(tokens: &[String]) -> Option<String> {
    let text = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() { None } else { Some(text) }
}

/// Splits text into whitespace-delimited tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
