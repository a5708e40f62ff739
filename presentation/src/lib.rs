//! Presentation layer for agora
//!
//! This crate contains CLI definitions, console formatting and the
//! interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::Cli;
pub use output::console::{ConsoleFormatter, ConsoleNotifier};
