//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod decide_next_speaker;
pub mod execute_turn;
pub mod generation;
pub mod manage_sessions;
pub mod persistence_sync;
pub mod session_controller;

#[cfg(test)]
pub(crate) mod testing;
