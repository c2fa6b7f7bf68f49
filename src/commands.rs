/// Local slash command recognized before input reaches the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    Status,
    Cancel,
    Unknown(String),
}

/// Parses a leading slash command out of raw input.
///
/// Returns `None` for ordinary chat text; unknown `/...` tokens are surfaced
/// as `Unknown` so the caller can report them instead of streaming them.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/clear" => SlashCommand::Clear,
        "/status" => SlashCommand::Status,
        "/cancel" => SlashCommand::Cancel,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::{parse_slash_command, SlashCommand};

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello there"), None);
        assert_eq!(parse_slash_command("  spaced input  "), None);
    }

    #[test]
    fn known_commands_parse_with_trailing_arguments_ignored() {
        assert_eq!(parse_slash_command("/help"), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("  /clear  "), Some(SlashCommand::Clear));
        assert_eq!(
            parse_slash_command("/status verbose"),
            Some(SlashCommand::Status)
        );
        assert_eq!(parse_slash_command("/cancel"), Some(SlashCommand::Cancel));
    }

    #[test]
    fn unknown_slash_tokens_are_reported_not_streamed() {
        assert_eq!(
            parse_slash_command("/frobnicate now"),
            Some(SlashCommand::Unknown("/frobnicate".to_string()))
        );
    }
}
