//! Command-line parsing for chat messages.

use crate::chat::escape_html;
use crate::moderation::resolver::tokenize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Promote,
    Demote,
    Ban,
    TempBan,
    Kick,
    KickMe,
    Unban,
    Pin,
    Unpin,
    InviteLink,
    AdminList,
    Settings,
    Help,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Command::Promote,
        Command::Demote,
        Command::Ban,
        Command::TempBan,
        Command::Kick,
        Command::KickMe,
        Command::Unban,
        Command::Pin,
        Command::Unpin,
        Command::InviteLink,
        Command::AdminList,
        Command::Settings,
        Command::Help,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Promote => "promote",
            Command::Demote => "demote",
            Command::Ban => "ban",
            Command::TempBan => "tban",
            Command::Kick => "kick",
            Command::KickMe => "kickme",
            Command::Unban => "unban",
            Command::Pin => "pin",
            Command::Unpin => "unpin",
            Command::InviteLink => "invitelink",
            Command::AdminList => "adminlist",
            Command::Settings => "settings",
            Command::Help => "help",
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            Command::Promote => "<user>: give a member the bot's admin rights",
            Command::Demote => "<user>: strip an admin's rights",
            Command::Ban => "<user> [reason]: ban a user",
            Command::TempBan => "<user> <x(m/h/d)> [reason]: ban a user for a while",
            Command::Kick => "<user> [reason]: remove a user, they may rejoin",
            Command::KickMe => ": leave the chat",
            Command::Unban => "<user> [reason]: let a banned user rejoin",
            Command::Pin => "[loud]: pin the replied message, silently unless loud",
            Command::Unpin => ": unpin the pinned message",
            Command::InviteLink => ": get the chat's invite link",
            Command::AdminList => ": list the chat's admins",
            Command::Settings => ": show your standing in this chat",
            Command::Help => ": show this message",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name {
            "tempban" => Command::TempBan,
            "admins" => Command::AdminList,
            name => *Command::ALL.iter().find(|c| c.name() == name)?,
        };
        Some(command)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub args: Vec<String>,
}

/// Parses `<prefix><name>[@bot] args...`.
///
/// Returns `None` for ordinary text, unknown commands and commands addressed
/// to another bot.
pub fn parse(text: &str, prefixes: &str, bot_username: Option<&str>) -> Option<ParsedCommand> {
    let prefix = text.chars().next()?;
    if !prefixes.contains(prefix) {
        return None;
    }
    let body = &text[prefix.len_utf8()..];

    let (head, rest) = body
        .split_once(char::is_whitespace)
        .unwrap_or((body, ""));
    let (name, addressee) = match head.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (head, None),
    };

    if let (Some(addressee), Some(me)) = (addressee, bot_username)
        && !addressee.eq_ignore_ascii_case(me)
    {
        return None;
    }

    let command = Command::from_name(&name.to_lowercase())?;
    Some(ParsedCommand {
        command,
        args: tokenize(rest),
    })
}

pub fn help_text() -> String {
    let mut text = String::from("<b>Moderation commands</b>");
    for command in Command::ALL {
        text.push_str(&format!("\n/{}{}", command.name(), escape_html(command.usage())));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_command() {
        let parsed = parse("/ban 42 spamming links", "/!", Some("modgate_bot")).unwrap();
        assert_eq!(parsed.command, Command::Ban);
        assert_eq!(parsed.args, vec!["42", "spamming", "links"]);
    }

    #[test]
    fn test_parse_alternative_prefix_and_alias() {
        let parsed = parse("!tempban @bob 2h", "/!", None).unwrap();
        assert_eq!(parsed.command, Command::TempBan);
        assert_eq!(parsed.args, vec!["@bob", "2h"]);
    }

    #[test]
    fn test_parse_addressed_commands() {
        let parsed = parse("/kick@ModGate_Bot", "/", Some("modgate_bot")).unwrap();
        assert_eq!(parsed.command, Command::Kick);
        assert!(parsed.args.is_empty());

        assert_eq!(parse("/kick@other_bot 42", "/", Some("modgate_bot")), None);
    }

    #[test]
    fn test_parse_ignores_other_text() {
        assert_eq!(parse("hello there", "/!", None), None);
        assert_eq!(parse("/unknown 42", "/!", None), None);
        assert_eq!(parse("#ban 42", "/!", None), None);
        assert_eq!(parse("", "/!", None), None);
    }

    #[test]
    fn test_every_command_round_trips_by_name() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn test_help_lists_commands() {
        let help = help_text();
        assert!(help.contains("/tban &lt;user&gt; &lt;x(m/h/d)&gt; [reason]"));
        assert!(help.contains("/kickme"));
    }
}
