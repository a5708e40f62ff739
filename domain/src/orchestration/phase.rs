//! Phase state machine

use crate::conversation::message::{Message, SystemEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a council session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Divergent discussion, opinions and questions
    #[default]
    Exploration,
    /// Converging on the strongest ideas
    Synthesis,
    /// Concrete next steps
    Action,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Exploration, Phase::Synthesis, Phase::Action];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Exploration => "exploration",
            Phase::Synthesis => "synthesis",
            Phase::Action => "action",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Exploration => "Exploration",
            Phase::Synthesis => "Synthesis",
            Phase::Action => "Action",
        }
    }

    /// The phase an automatic advance moves to; `None` once terminal
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Exploration => Some(Phase::Synthesis),
            Phase::Synthesis => Some(Phase::Action),
            Phase::Action => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exploration" | "explore" | "e" => Ok(Phase::Exploration),
            "synthesis" | "synth" | "s" => Ok(Phase::Synthesis),
            "action" | "a" => Ok(Phase::Action),
            _ => Err(format!("Invalid phase: {}", s)),
        }
    }
}

/// Count persona replies since the most recent phase-change event.
///
/// Human messages and other system events do not count.
pub fn turns_in_current_phase(history: &[Message]) -> usize {
    history
        .iter()
        .rev()
        .take_while(|m| !m.is_phase_change())
        .filter(|m| m.is_from_persona())
        .count()
}

/// Guardrail for automatic phase advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseGuard {
    /// Minimum persona replies in the current phase before an advance is honored
    pub min_turns: usize,
}

impl Default for PhaseGuard {
    fn default() -> Self {
        Self { min_turns: 6 }
    }
}

impl PhaseGuard {
    pub fn new(min_turns: usize) -> Self {
        Self { min_turns }
    }

    /// Whether a recommended advance may be applied to `history` at `phase`
    pub fn permits_advance(&self, history: &[Message], phase: Phase) -> bool {
        !phase.is_terminal() && turns_in_current_phase(history) >= self.min_turns
    }

    /// Resolve an advance recommendation into a concrete transition
    pub fn advance(&self, history: &[Message], phase: Phase, recommended: bool) -> Option<Phase> {
        if recommended && self.permits_advance(history, phase) {
            phase.next()
        } else {
            None
        }
    }
}

/// Phase recorded by the most recent phase-change event in `history`, if any
pub fn last_recorded_phase(history: &[Message]) -> Option<Phase> {
    history.iter().rev().find_map(|m| match &m.event {
        Some(SystemEvent::PhaseChanged { to, .. }) => Some(*to),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona_turns(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message::persona("atlas".into(), format!("turn {i}")))
            .collect()
    }

    #[test]
    fn test_next_is_forward_only() {
        assert_eq!(Phase::Exploration.next(), Some(Phase::Synthesis));
        assert_eq!(Phase::Synthesis.next(), Some(Phase::Action));
        assert_eq!(Phase::Action.next(), None);
        assert!(Phase::Action.is_terminal());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("SYNTHESIS".parse::<Phase>().unwrap(), Phase::Synthesis);
        assert_eq!("a".parse::<Phase>().unwrap(), Phase::Action);
        assert!("debate".parse::<Phase>().is_err());
    }

    #[test]
    fn test_turn_count_ignores_human_and_resets_on_phase_change() {
        let mut history = persona_turns(3);
        history.push(Message::human("thoughts?"));
        assert_eq!(turns_in_current_phase(&history), 3);

        history.push(Message::phase_changed(
            Phase::Exploration,
            Phase::Synthesis,
            false,
        ));
        assert_eq!(turns_in_current_phase(&history), 0);
        history.extend(persona_turns(2));
        assert_eq!(turns_in_current_phase(&history), 2);
        assert_eq!(last_recorded_phase(&history), Some(Phase::Synthesis));
    }

    #[test]
    fn test_guard_rejects_premature_advance() {
        let guard = PhaseGuard::new(4);
        let history = persona_turns(3);
        assert_eq!(guard.advance(&history, Phase::Exploration, true), None);

        let history = persona_turns(4);
        assert_eq!(
            guard.advance(&history, Phase::Exploration, true),
            Some(Phase::Synthesis)
        );
        assert_eq!(guard.advance(&history, Phase::Exploration, false), None);
    }

    #[test]
    fn test_guard_never_advances_past_action() {
        let guard = PhaseGuard::new(1);
        let history = persona_turns(10);
        assert_eq!(guard.advance(&history, Phase::Action, true), None);
    }
}
