//! Terminal presentation: console output, markdown rendering, and help text.

pub mod console;
pub mod help;
pub mod markdown;

pub use console::ConsoleSink;
