//! Prompt domain
//!
//! Templates for every generation call the orchestrator makes: persona
//! replies, speaker routing, and the summary artifacts.

mod template;

pub use template::{PromptTemplate, ReplyTone};
