//! Parsing of structured generation output.
//!
//! The router, the action plan and the starter generator all ask for JSON.
//! Models wrap it in prose or fenced blocks often enough that every parser
//! first isolates the JSON payload with [`extract_json_block`].

mod response;

pub use response::{extract_json_block, parse_action_plan, parse_speaker_proposal, parse_starters};
