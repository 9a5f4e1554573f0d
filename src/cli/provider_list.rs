use std::error::Error;
use std::io::{self, IsTerminal};

use ratatui::crossterm::terminal;

use crate::core::config::Config;
use crate::core::providers::{provider_statuses, ProviderStatus};
use crate::ui::markdown::{line_to_ansi, render_markdown};

pub fn list_providers() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let statuses = provider_statuses(&config);
    let content = format_provider_list(&statuses, config.default_provider());

    let color = io::stdout().is_terminal();
    let width = terminal::size().ok().map(|(w, _)| w as usize);
    for line in render_markdown(&content, width) {
        println!("{}", line_to_ansi(&line, color));
    }
    Ok(())
}

/// Markdown listing of every provider; the default one is starred.
pub fn format_provider_list(statuses: &[ProviderStatus], default_provider: &str) -> String {
    let mut content = String::from("## Providers\n\n");

    for status in statuses {
        let marker = if status.id.eq_ignore_ascii_case(default_provider) {
            "\\*"
        } else {
            ""
        };
        let auth = if status.configured {
            "✅ configured".to_string()
        } else {
            format!("❌ set `{}`", status.api_key_env)
        };
        content.push_str(&format!(
            "- **{}**{} ({}): default model `{}`, {}\n",
            status.id, marker, status.display_name, status.default_model, auth
        ));
    }

    content.push_str("\n\\* = default provider\n");
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str, configured: bool) -> ProviderStatus {
        ProviderStatus {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            configured,
            default_model: format!("{id}-model"),
            api_key_env: format!("{}_API_KEY", id.to_uppercase()),
        }
    }

    #[test]
    fn marks_default_and_configured_providers() {
        let statuses = vec![status("openai", true), status("google", false)];
        let text = format_provider_list(&statuses, "google");

        assert!(text.contains("- **openai** (OPENAI): default model `openai-model`, ✅ configured"));
        assert!(text.contains("- **google**\\* (GOOGLE)"));
        assert!(text.contains("❌ set `GOOGLE_API_KEY`"));
    }

    #[test]
    fn rendered_list_has_no_markup_left() {
        let statuses = vec![status("anthropic", true)];
        let text = format_provider_list(&statuses, "openai");
        let rendered: Vec<String> = render_markdown(&text, None)
            .iter()
            .map(|line| line_to_ansi(line, false))
            .collect();

        assert!(rendered.iter().any(|line| line.contains("anthropic (ANTHROPIC)")));
        assert!(rendered.iter().all(|line| !line.contains("**")));
    }
}
