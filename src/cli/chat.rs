//! Interactive chat entrypoint.

use std::error::Error;

use tracing::debug;

use crate::core::config::Config;
use crate::core::providers::{ProviderRegistry, ResolveError};
use crate::core::session::{OutputSink, Session, SessionOptions};
use crate::ui::help::welcome_md;
use crate::ui::ConsoleSink;
use crate::utils::line_editor::LineEditor;

pub async fn run_chat(
    provider: Option<String>,
    model: Option<String>,
    streaming: bool,
) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let provider = provider
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| config.default_provider().to_string());

    let registry = ProviderRegistry::new(&config);
    let options = SessionOptions {
        model,
        streaming,
        ..SessionOptions::new(provider)
    };

    let mut session = match Session::start(registry, options) {
        Ok(session) => session,
        Err(err) => exit_with_resolve_error(&err),
    };

    let mut output = ConsoleSink::stdout();
    output.markdown(&welcome_md(
        session.provider(),
        session.model(),
        session.is_streaming(),
    ));

    let mut input = LineEditor::new();
    session.run(&mut input, &mut output).await?;
    debug!("Session ended");
    Ok(())
}

fn exit_with_resolve_error(err: &ResolveError) -> ! {
    eprintln!("❌ {err}");
    let fixes = err.quick_fixes();
    if !fixes.is_empty() {
        eprintln!();
        eprintln!("💡 Quick fixes:");
        for fix in fixes {
            eprintln!("  {fix}");
        }
    }
    std::process::exit(err.exit_code());
}
