//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod provider_list;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::provider_list::list_providers;
use crate::cli::settings::{apply_set, apply_unset, format_all};
use crate::core::config::ConfigFile;
use crate::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "awb")]
#[command(about = "A terminal chat workbench for OpenAI, Anthropic, and Google models")]
#[command(
    long_about = "AI Workbench is a line-oriented terminal chat client. It keeps one \
conversation in memory and sends it to the selected provider, streaming replies as \
they arrive.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY      Key for the openai provider\n\
  ANTHROPIC_API_KEY   Key for the anthropic provider\n\
  GOOGLE_API_KEY      Key for the google provider\n\
  DEFAULT_PROVIDER    Provider used when -p is not given\n\
  DEFAULT_MODEL       Fallback model for providers without a configured default\n\
  AWB_LOG             Log filter (for example: ai_workbench=debug)\n\n\
Variables may also be placed in a .env file in the working directory.\n\n\
Commands inside a session:\n\
  /help               Show commands and keys\n\
  /provider <name>    Switch provider\n\
  /model <name>       Switch model\n\
  /exit               Leave the session"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider to chat with (openai, anthropic, google)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to use instead of the provider's default
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Wait for complete replies instead of streaming them
    #[arg(long, global = true)]
    pub no_stream: bool,

    /// Append diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat session (default)
    Chat,
    /// List providers and whether they are configured
    Providers,
    /// Set configuration values, or show them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value for the key (provider and model for default-model)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// Provider, for default-model
        value: Option<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.debug_log.as_deref())?;

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(args.provider, args.model, !args.no_stream).await,
        Commands::Providers => list_providers(),
        Commands::Set { key, value } => {
            let mut config = ConfigFile::load()?;
            let Some(key) = key else {
                println!("{}", format_all(&config));
                return Ok(());
            };
            match apply_set(&mut config, &key, &value) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(err.exit_code());
                }
            }
        }
        Commands::Unset { key, value } => {
            let mut config = ConfigFile::load()?;
            match apply_unset(&mut config, &key, value.as_deref()) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(err.exit_code());
                }
            }
        }
    }
}
