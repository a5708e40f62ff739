//! Persona definitions from TOML (`[[participants]]` entries)

use agora_domain::Participant;
use serde::{Deserialize, Serialize};

/// One configured persona
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParticipantConfig {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Persona system instruction
    pub instruction: String,
    /// Terminal color name used by the console formatter
    pub color: Option<String>,
}

impl FileParticipantConfig {
    pub fn to_participant(&self) -> Participant {
        let name = if self.name.trim().is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        };
        let participant =
            Participant::new(self.id.trim(), name, self.role.clone(), self.instruction.clone());
        match &self.color {
            Some(color) => participant.with_color(color.clone()),
            None => participant,
        }
    }
}
