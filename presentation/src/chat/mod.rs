//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface for a session.

mod command;
mod repl;

pub use command::{HELP, ReplCommand, parse_line};
pub use repl::ChatRepl;
