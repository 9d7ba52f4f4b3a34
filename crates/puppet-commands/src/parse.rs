//! Recognizing commands in chat messages.

/// A command name and its argument text, split from a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name.
    pub command: String,
    /// Everything after the command name, trimmed.
    pub args: String,
}

/// Extract a command from a message body.
///
/// Outside the management room a message is a command only when it starts
/// with `prefix` followed by whitespace. In the management room the prefix is
/// optional. Returns `None` for ordinary messages and bare prefixes.
pub fn parse_command(body: &str, prefix: &str, is_management: bool) -> Option<ParsedCommand> {
    let body = body.trim();
    let prefixed = body
        .strip_prefix(prefix)
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));

    let rest = match prefixed {
        Some(rest) => rest.trim_start(),
        None if is_management => body,
        None => return None,
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next().filter(|c| !c.is_empty())?.to_lowercase();
    let args = parts.next().unwrap_or("").trim().to_string();
    Some(ParsedCommand { command, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(command: &str, args: &str) -> Option<ParsedCommand> {
        Some(ParsedCommand {
            command: command.into(),
            args: args.into(),
        })
    }

    #[test]
    fn test_prefixed_command() {
        assert_eq!(parse_command("!tw ping", "!tw", false), parsed("ping", ""));
        assert_eq!(
            parse_command("!tw  SYNC  now please ", "!tw", false),
            parsed("sync", "now please")
        );
    }

    #[test]
    fn test_prefix_required_outside_management() {
        assert_eq!(parse_command("ping", "!tw", false), None);
        assert_eq!(parse_command("hello there", "!tw", false), None);
    }

    #[test]
    fn test_prefix_optional_in_management() {
        assert_eq!(parse_command("ping", "!tw", true), parsed("ping", ""));
        assert_eq!(parse_command("!tw ping", "!tw", true), parsed("ping", ""));
    }

    #[test]
    fn test_prefix_must_be_followed_by_space() {
        assert_eq!(parse_command("!twping", "!tw", false), None);
        // In the management room the whole word is taken as the command name
        assert_eq!(parse_command("!twping", "!tw", true), parsed("!twping", ""));
    }

    #[test]
    fn test_bare_prefix_and_empty_body() {
        assert_eq!(parse_command("!tw", "!tw", false), None);
        assert_eq!(parse_command("!tw   ", "!tw", true), None);
        assert_eq!(parse_command("", "!tw", true), None);
    }

    #[test]
    fn test_multiline_args() {
        assert_eq!(
            parse_command("!tw login\nuser\npass", "!tw", false),
            parsed("login", "user\npass")
        );
    }
}
