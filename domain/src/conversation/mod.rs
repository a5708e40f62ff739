//! Conversation domain.
//!
//! - [`message::Message`]: one entry in a session's append-only log
//! - [`action_plan::ActionPlan`]: structured checklist attached to a message
//! - [`log`]: edits and lookups over the ordered log

pub mod action_plan;
pub mod log;
pub mod message;
