//! Speaker selection decisions and the guardrails applied to router proposals

use super::phase::{Phase, PhaseGuard};
use crate::conversation::message::Message;
use crate::core::error::DomainError;
use crate::participant::entities::ParticipantId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Raw speaker proposal returned by the router, before any guardrail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerProposal {
    #[serde(default, alias = "nextSpeakerId")]
    pub next_speaker_id: Option<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "advancePhase", alias = "shouldAdvancePhase")]
    pub advance_phase: bool,
}

/// Where a decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// One-on-one session, the sole participant always speaks
    Direct,
    /// Accepted router proposal
    Router,
    /// Random pick after the router gave no usable candidate
    Fallback,
    /// Forced by a nudge
    Nudge,
}

/// Who speaks next and whether the phase advances (never persisted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDecision {
    pub next_speaker: Option<ParticipantId>,
    pub rationale: String,
    pub advance_phase: bool,
    pub source: DecisionSource,
}

impl TurnDecision {
    /// Direct mode: bypass selection, never advance
    pub fn direct(active: &[ParticipantId]) -> Result<Self, DomainError> {
        match active {
            [only] => Ok(Self {
                next_speaker: Some(only.clone()),
                rationale: "Direct conversation".to_string(),
                advance_phase: false,
                source: DecisionSource::Direct,
            }),
            _ => Err(DomainError::InvalidDirectRoster(active.len())),
        }
    }

    pub fn nudged(speaker: ParticipantId) -> Self {
        Self {
            next_speaker: Some(speaker),
            rationale: "Manual intervention".to_string(),
            advance_phase: false,
            source: DecisionSource::Nudge,
        }
    }

    /// Router unavailable: random fallback, no phase advance
    pub fn fallback<R: Rng + ?Sized>(
        history: &[Message],
        active: &[ParticipantId],
        rng: &mut R,
        reason: &str,
    ) -> Self {
        Self {
            next_speaker: fallback_speaker(history, active, rng),
            rationale: format!("Fallback selection ({reason})"),
            advance_phase: false,
            source: DecisionSource::Fallback,
        }
    }

    /// Apply the policy-layer guardrails to a router proposal.
    ///
    /// Candidates outside `active` are replaced by a random fallback and an
    /// advance recommendation is dropped unless `guard` permits it.
    pub fn from_proposal<R: Rng + ?Sized>(
        proposal: SpeakerProposal,
        history: &[Message],
        active: &[ParticipantId],
        phase: Phase,
        guard: &PhaseGuard,
        rng: &mut R,
    ) -> Self {
        let advance_phase = guard
            .advance(history, phase, proposal.advance_phase)
            .is_some();

        let accepted = proposal
            .next_speaker_id
            .as_deref()
            .map(str::trim)
            .and_then(|id| active.iter().find(|a| a.as_str() == id));

        match accepted {
            Some(speaker) => Self {
                next_speaker: Some(speaker.clone()),
                rationale: proposal.reasoning,
                advance_phase,
                source: DecisionSource::Router,
            },
            None => {
                let reason = match proposal.next_speaker_id {
                    Some(id) if !id.trim().is_empty() => format!("unknown speaker '{}'", id),
                    _ => "no candidate".to_string(),
                };
                Self {
                    advance_phase,
                    ..Self::fallback(history, active, rng, &reason)
                }
            }
        }
    }

    /// Phase this decision moves to, if it advances
    pub fn next_phase(&self, current: Phase) -> Option<Phase> {
        if self.advance_phase {
            current.next()
        } else {
            None
        }
    }
}

/// Most recent persona author in `history`
pub fn last_persona_speaker(history: &[Message]) -> Option<&ParticipantId> {
    history
        .iter()
        .rev()
        .find(|m| m.is_from_persona())
        .map(|m| &m.sender)
}

/// Uniform random pick among `active`, excluding the last persona speaker
/// unless that leaves nobody.
pub fn fallback_speaker<R: Rng + ?Sized>(
    history: &[Message],
    active: &[ParticipantId],
    rng: &mut R,
) -> Option<ParticipantId> {
    let last = last_persona_speaker(history);
    let candidates: Vec<&ParticipantId> = active.iter().filter(|id| Some(*id) != last).collect();
    if candidates.is_empty() {
        active.choose(rng).cloned()
    } else {
        candidates.choose(rng).map(|id| (*id).clone())
    }
}
