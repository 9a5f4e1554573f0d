//! Diagnostic logging setup.
//!
//! Log lines go to stderr, or to a file when `--debug-log` is given so they
//! do not interleave with the conversation. `AWB_LOG` takes any
//! `tracing-subscriber` filter directive.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "AWB_LOG";

/// Filter used when `AWB_LOG` is unset or invalid.
pub fn default_directive(to_file: bool) -> &'static str {
    if to_file {
        "ai_workbench=debug,warn"
    } else {
        "warn"
    }
}

fn build_filter(directive: Option<&str>, to_file: bool) -> EnvFilter {
    directive
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(to_file)))
}

/// Installs the global subscriber. Call once, before the session starts.
pub fn init_logging(debug_log: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let directive = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(directive.as_deref(), debug_log.is_some());

    match debug_log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
    }
    Ok(())
}
