use crate::commands::commands_help_md;

const INTRO_MD: &str = "Type a message and press Enter to send it. Lines starting with `/` are commands.";

const KEYS_MD: &str = "## Keys
- `Up` / `Down`: recall earlier input
- `Ctrl+A` / `Ctrl+E`: start or end of line
- `Ctrl+W` / `Ctrl+U` / `Ctrl+K`: delete word, line, or to end
- `Ctrl+C`: discard the current line
- `Ctrl+D`: leave on an empty line";

/// Full `/help` text.
pub fn help_md() -> String {
    format!("{INTRO_MD}\n\n{}\n{KEYS_MD}\n", commands_help_md())
}

/// Banner shown when an interactive session starts.
pub fn welcome_md(provider: &str, model: &str, streaming: bool) -> String {
    let mode = if streaming { "streaming" } else { "blocking" };
    format!(
        "# AI Workbench\n\nConnected to **{provider}** using `{model}` ({mode} replies). Type `/help` for commands, `/exit` to leave."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_includes_commands_and_keys() {
        let help = help_md();
        assert!(help.contains("/provider <name>"));
        assert!(help.contains("Ctrl+D"));
    }

    #[test]
    fn welcome_names_provider_model_and_mode() {
        let welcome = welcome_md("anthropic", "claude-3-5-sonnet-20241022", false);
        assert!(welcome.contains("**anthropic**"));
        assert!(welcome.contains("`claude-3-5-sonnet-20241022`"));
        assert!(welcome.contains("blocking"));
    }
}
