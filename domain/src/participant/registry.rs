//! Participant registry

use super::entities::{Participant, ParticipantId};
use crate::core::error::DomainError;
use std::collections::HashMap;

/// Id-keyed collection of participant configurations.
///
/// Supplied by the surrounding application; the orchestrator only reads it.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let mut registry = Self::new();
        for participant in participants {
            registry.insert(participant);
        }
        registry
    }

    /// Insert or replace a participant, returning the previous entry
    pub fn insert(&mut self, participant: Participant) -> Option<Participant> {
        self.participants.insert(participant.id.clone(), participant)
    }

    pub fn remove(&mut self, id: &str) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// All participants sorted by id
    pub fn all(&self) -> Vec<&Participant> {
        let mut all: Vec<_> = self.participants.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Resolve a list of ids, failing on the first unknown one
    pub fn resolve(&self, ids: &[ParticipantId]) -> Result<Vec<&Participant>, DomainError> {
        ids.iter()
            .map(|id| {
                self.get(id.as_str())
                    .ok_or_else(|| DomainError::UnknownParticipant(id.to_string()))
            })
            .collect()
    }

    /// Display names for a list of ids, in order
    pub fn names_for(&self, ids: &[ParticipantId]) -> Vec<String> {
        ids.iter().map(|id| self.display_name(id)).collect()
    }

    /// Name shown for a message sender
    pub fn display_name(&self, id: &ParticipantId) -> String {
        if id.is_user() {
            return "You".to_string();
        }
        if id.is_system() {
            return "Moderator".to_string();
        }
        self.get(id.as_str())
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
