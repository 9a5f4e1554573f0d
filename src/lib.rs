//! AI Workbench is a line-oriented terminal chat client for remote LLM APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation log, configuration, provider resolution,
//!   the three provider adapters, and the session controller.
//! - [`commands`] parses slash commands typed at the prompt.
//! - [`ui`] writes notices and rendered markdown to the terminal.
//! - [`api`] defines the request and response payloads for each backend.
//! - [`utils`] holds the interactive line editor and logging setup.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which
//! builds the runtime and starts an interactive [`core::session::Session`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
