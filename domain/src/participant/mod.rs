//! Participant domain.
//!
//! - [`entities::Participant`]: a configured AI persona
//! - [`entities::ParticipantId`]: persona id, or the reserved user/system ids
//! - [`registry::ParticipantRegistry`]: id-keyed lookup of participants
//! - [`presets`]: built-in personas and councils

pub mod entities;
pub mod presets;
pub mod registry;
