//! Slash-command parsing.
//!
//! Input starting with `/` is a command: the first whitespace-delimited token
//! names it (case-insensitively) and the rest of the line is its argument.
//! Everything else is a chat turn.

mod registry;

pub use registry::{all_commands, find_command, Command};

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

pub const COMMAND_PREFIX: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Exit,
    Help,
    Clear,
    Provider(String),
    Model(String),
    System(Option<String>),
    Save(Option<PathBuf>),
    Load(PathBuf),
    Status,
}

/// A known command invoked without a required argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageError {
    pub usage: &'static str,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Usage: {}", self.usage)
    }
}

impl Error for UsageError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Empty,
    Chat(String),
    Command(SlashCommand),
    Usage(UsageError),
    Unknown(String),
}

/// Classifies one line of input. Only a line whose first character is `/`
/// is a command; chat text is kept exactly as typed.
pub fn process_input(input: &str) -> ParsedInput {
    if input.trim().is_empty() {
        return ParsedInput::Empty;
    }

    let Some(rest) = input.strip_prefix(COMMAND_PREFIX) else {
        return ParsedInput::Chat(input.to_string());
    };

    let rest = rest.trim_end();
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match find_command(name) {
        Some(command) => match (command.parse)(args) {
            Ok(command) => ParsedInput::Command(command),
            Err(usage) => ParsedInput::Usage(usage),
        },
        None => ParsedInput::Unknown(format!("{COMMAND_PREFIX}{name}")),
    }
}

/// Markdown list of every command, in table order.
pub fn commands_help_md() -> String {
    let mut help_md = String::from("## Commands\n");
    for command in all_commands() {
        help_md.push_str(&format!("- `{}`: {}\n", command.usage, command.help));
    }
    help_md
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(process_input(""), ParsedInput::Empty);
        assert_eq!(process_input("   \t "), ParsedInput::Empty);
    }

    #[test]
    fn plain_text_is_a_chat_turn() {
        assert_eq!(
            process_input("explain lifetimes"),
            ParsedInput::Chat("explain lifetimes".to_string())
        );
    }

    #[test]
    fn chat_text_keeps_its_indentation() {
        assert_eq!(
            process_input("    let x = 1;"),
            ParsedInput::Chat("    let x = 1;".to_string())
        );
    }

    #[test]
    fn indented_slash_is_chat_not_a_command() {
        assert_eq!(
            process_input("  /help"),
            ParsedInput::Chat("  /help".to_string())
        );
    }

    #[test]
    fn provider_takes_only_the_first_word() {
        assert_eq!(
            process_input("/provider google extra"),
            ParsedInput::Command(SlashCommand::Provider("google".to_string()))
        );
    }

    #[test]
    fn model_takes_only_the_first_word() {
        assert_eq!(
            process_input("/model gpt-4o please"),
            ParsedInput::Command(SlashCommand::Model("gpt-4o".to_string()))
        );
    }

    #[test]
    fn system_keeps_the_whole_line() {
        assert_eq!(
            process_input("/system Be brief. Use examples."),
            ParsedInput::Command(SlashCommand::System(Some(
                "Be brief. Use examples.".to_string()
            )))
        );
    }

    #[test]
    fn exit_and_quit_both_end_the_session() {
        assert_eq!(process_input("/exit"), ParsedInput::Command(SlashCommand::Exit));
        assert_eq!(process_input("/QUIT"), ParsedInput::Command(SlashCommand::Exit));
    }

    #[test]
    fn provider_names_are_lowercased() {
        assert_eq!(
            process_input("/Provider Anthropic"),
            ParsedInput::Command(SlashCommand::Provider("anthropic".to_string()))
        );
    }

    #[test]
    fn model_keeps_argument_verbatim() {
        assert_eq!(
            process_input("/model   gpt-4o-Mini "),
            ParsedInput::Command(SlashCommand::Model("gpt-4o-Mini".to_string()))
        );
    }

    #[test]
    fn missing_required_argument_is_a_usage_error() {
        let ParsedInput::Usage(err) = process_input("/provider") else {
            panic!("expected usage error");
        };
        assert_eq!(err.to_string(), "Usage: /provider <name>");
        assert!(matches!(process_input("/model  "), ParsedInput::Usage(_)));
        assert!(matches!(process_input("/load"), ParsedInput::Usage(_)));
    }

    #[test]
    fn optional_arguments() {
        assert_eq!(
            process_input("/system"),
            ParsedInput::Command(SlashCommand::System(None))
        );
        assert_eq!(
            process_input("/system Answer in French."),
            ParsedInput::Command(SlashCommand::System(Some("Answer in French.".to_string())))
        );
        assert_eq!(
            process_input("/save"),
            ParsedInput::Command(SlashCommand::Save(None))
        );
        assert_eq!(
            process_input("/save chat.json"),
            ParsedInput::Command(SlashCommand::Save(Some(PathBuf::from("chat.json"))))
        );
    }

    #[test]
    fn unknown_commands_are_named() {
        assert_eq!(
            process_input("/frobnicate now"),
            ParsedInput::Unknown("/frobnicate".to_string())
        );
    }

    #[test]
    fn help_lists_every_command() {
        let help = commands_help_md();
        for command in all_commands() {
            assert!(help.contains(command.usage), "missing {}", command.name);
        }
    }
}
