use super::{SlashCommand, UsageError};
use std::path::PathBuf;

pub type CommandParser = fn(&str) -> Result<SlashCommand, UsageError>;

pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub help: &'static str,
    pub parse: CommandParser,
}

impl Command {
    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands().iter().find(|command| command.matches(name))
}

fn optional(args: &str) -> Option<String> {
    (!args.is_empty()).then(|| args.to_string())
}

fn required(args: &str, usage: &'static str) -> Result<String, UsageError> {
    optional(args).ok_or(UsageError { usage })
}

/// First whitespace-delimited word of `args`; anything after it is ignored.
fn required_word(args: &str, usage: &'static str) -> Result<String, UsageError> {
    args.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(UsageError { usage })
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        aliases: &[],
        usage: "/help",
        help: "Show available commands.",
        parse: |_| Ok(SlashCommand::Help),
    },
    Command {
        name: "clear",
        aliases: &[],
        usage: "/clear",
        help: "Forget the conversation so far. The system instruction is kept.",
        parse: |_| Ok(SlashCommand::Clear),
    },
    Command {
        name: "provider",
        aliases: &[],
        usage: "/provider <name>",
        help: "Switch to another provider (openai, anthropic, google).",
        parse: |args| {
            required_word(args, "/provider <name>")
                .map(|name| SlashCommand::Provider(name.to_lowercase()))
        },
    },
    Command {
        name: "model",
        aliases: &[],
        usage: "/model <name>",
        help: "Switch the model used by the current provider.",
        parse: |args| required_word(args, "/model <name>").map(SlashCommand::Model),
    },
    Command {
        name: "system",
        aliases: &[],
        usage: "/system [text]",
        help: "Show the system instruction, or replace it with new text.",
        parse: |args| Ok(SlashCommand::System(optional(args))),
    },
    Command {
        name: "save",
        aliases: &[],
        usage: "/save [path]",
        help: "Save the conversation as JSON (defaults to a dated file name).",
        parse: |args| Ok(SlashCommand::Save(optional(args).map(PathBuf::from))),
    },
    Command {
        name: "load",
        aliases: &[],
        usage: "/load <path>",
        help: "Replace the conversation with one saved earlier.",
        parse: |args| required(args, "/load <path>").map(|path| SlashCommand::Load(PathBuf::from(path))),
    },
    Command {
        name: "status",
        aliases: &[],
        usage: "/status",
        help: "Show the provider, model, and conversation length.",
        parse: |_| Ok(SlashCommand::Status),
    },
    Command {
        name: "exit",
        aliases: &["quit"],
        usage: "/exit",
        help: "Leave the session (also /quit).",
        parse: |_| Ok(SlashCommand::Exit),
    },
];
