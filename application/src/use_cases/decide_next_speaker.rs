//! Decision policy
//!
//! Decides who speaks next. Direct sessions bypass selection; council
//! sessions ask the router and then apply guardrails: candidates outside
//! the room are replaced by a random fallback and premature phase advances
//! are dropped. A router failure is treated as "no candidate".

use crate::ports::generation_client::{GenerationClient, RouterRequest};
use agora_domain::{
    DomainError, Message, Participant, ParticipantId, ParticipantRegistry, Phase, PhaseGuard,
    SessionMode, TurnDecision,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Everything a decision looks at
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub history: &'a [Message],
    pub active: &'a [ParticipantId],
    pub registry: &'a ParticipantRegistry,
    pub context: &'a str,
    pub phase: Phase,
    pub mode: SessionMode,
    pub interview: bool,
}

/// Speaker selection with policy-layer guardrails
pub struct DecisionPolicy {
    client: Arc<dyn GenerationClient>,
    guard: PhaseGuard,
    rng: Mutex<StdRng>,
}

impl DecisionPolicy {
    pub fn new(client: Arc<dyn GenerationClient>, guard: PhaseGuard) -> Self {
        Self {
            client,
            guard,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic fallback picks (tests, replays)
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn guard(&self) -> &PhaseGuard {
        &self.guard
    }

    pub async fn decide(&self, input: DecisionInput<'_>) -> Result<TurnDecision, DomainError> {
        if input.mode == SessionMode::Direct {
            return TurnDecision::direct(input.active);
        }

        let eligible: Vec<ParticipantId> = input
            .active
            .iter()
            .filter(|id| {
                let known = input.registry.contains(id.as_str());
                if !known {
                    warn!("Active participant {} is not registered; skipping", id);
                }
                known
            })
            .cloned()
            .collect();
        let candidates: Vec<&Participant> = eligible
            .iter()
            .filter_map(|id| input.registry.get(id.as_str()))
            .collect();

        let proposal = self
            .client
            .propose_speaker(RouterRequest {
                history: input.history,
                candidates: &candidates,
                registry: input.registry,
                context: input.context,
                phase: input.phase,
                mode: input.mode,
                interview: input.interview,
            })
            .await;

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let decision = match proposal {
            Ok(proposal) => TurnDecision::from_proposal(
                proposal,
                input.history,
                &eligible,
                input.phase,
                &self.guard,
                &mut *rng,
            ),
            Err(e) => {
                warn!("Router unavailable, falling back to random selection: {}", e);
                TurnDecision::fallback(input.history, &eligible, &mut *rng, "router unavailable")
            }
        };

        debug!(
            "Decision: {:?} via {:?} (advance: {})",
            decision.next_speaker, decision.source, decision.advance_phase
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::generation_client::ReplyRequest;
    use crate::ports::llm_gateway::GenerationError;
    use agora_domain::{DecisionSource, SpeakerProposal};
    use async_trait::async_trait;

    // ==================== Test Mocks ====================

    struct FixedRouter(Result<SpeakerProposal, GenerationError>);

    #[async_trait]
    impl GenerationClient for FixedRouter {
        async fn propose_speaker(
            &self,
            _request: RouterRequest<'_>,
        ) -> Result<SpeakerProposal, GenerationError> {
            self.0.clone()
        }

        async fn generate_reply(&self, _request: ReplyRequest<'_>) -> Result<String, GenerationError> {
            Ok("unused".to_string())
        }
    }

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::from_participants(vec![
            Participant::new("nova", "Nova", "Visionary", "Think big."),
            Participant::new("atlas", "Atlas", "Operator", "Ship it."),
            Participant::new("rex", "Rex", "Investor", "Show numbers."),
        ])
    }

    fn active() -> Vec<ParticipantId> {
        vec!["nova".into(), "atlas".into(), "rex".into()]
    }

    fn input<'a>(
        history: &'a [Message],
        active: &'a [ParticipantId],
        registry: &'a ParticipantRegistry,
        mode: SessionMode,
    ) -> DecisionInput<'a> {
        DecisionInput {
            history,
            active,
            registry,
            context: "",
            phase: Phase::Exploration,
            mode,
            interview: false,
        }
    }

    fn proposal(id: Option<&str>, advance: bool) -> SpeakerProposal {
        SpeakerProposal {
            next_speaker_id: id.map(str::to_string),
            reasoning: "because".to_string(),
            advance_phase: advance,
        }
    }

    #[tokio::test]
    async fn test_direct_mode_bypasses_router() {
        let policy = DecisionPolicy::new(
            Arc::new(FixedRouter(Err(GenerationError::Timeout))),
            PhaseGuard::default(),
        );
        let registry = registry();
        let active = vec![ParticipantId::from("rex")];
        let decision = policy
            .decide(input(&[], &active, &registry, SessionMode::Direct))
            .await
            .unwrap();
        assert_eq!(decision.source, DecisionSource::Direct);
        assert_eq!(decision.next_speaker, Some("rex".into()));
        assert!(!decision.advance_phase);
    }

    #[tokio::test]
    async fn test_router_choice_is_accepted() {
        let policy = DecisionPolicy::new(
            Arc::new(FixedRouter(Ok(proposal(Some("atlas"), false)))),
            PhaseGuard::default(),
        );
        let (registry, active) = (registry(), active());
        let decision = policy
            .decide(input(&[], &active, &registry, SessionMode::Council))
            .await
            .unwrap();
        assert_eq!(decision.source, DecisionSource::Router);
        assert_eq!(decision.next_speaker, Some("atlas".into()));
        assert_eq!(decision.rationale, "because");
    }

    #[tokio::test]
    async fn test_router_failure_falls_back_without_repeating() {
        let policy = DecisionPolicy::new(
            Arc::new(FixedRouter(Err(GenerationError::Connection("down".into())))),
            PhaseGuard::default(),
        )
        .with_rng_seed(42);
        let (registry, active) = (registry(), active());
        let history = vec![
            Message::human("hi"),
            Message::persona("nova".into(), "hello"),
        ];
        for _ in 0..20 {
            let decision = policy
                .decide(input(&history, &active, &registry, SessionMode::Council))
                .await
                .unwrap();
            assert_eq!(decision.source, DecisionSource::Fallback);
            assert_ne!(decision.next_speaker, Some("nova".into()));
            assert!(!decision.advance_phase);
        }
    }

    #[tokio::test]
    async fn test_unregistered_active_ids_are_never_chosen() {
        let policy = DecisionPolicy::new(
            Arc::new(FixedRouter(Ok(proposal(Some("ghost"), false)))),
            PhaseGuard::default(),
        )
        .with_rng_seed(1);
        let registry = registry();
        let active = vec![ParticipantId::from("ghost"), ParticipantId::from("rex")];
        let decision = policy
            .decide(input(&[], &active, &registry, SessionMode::Council))
            .await
            .unwrap();
        assert_eq!(decision.next_speaker, Some("rex".into()));
    }

    #[tokio::test]
    async fn test_advance_gated_by_guard() {
        let policy = DecisionPolicy::new(
            Arc::new(FixedRouter(Ok(proposal(Some("rex"), true)))),
            PhaseGuard::new(2),
        );
        let (registry, active) = (registry(), active());

        let one_turn = vec![Message::persona("nova".into(), "a")];
        let decision = policy
            .decide(input(&one_turn, &active, &registry, SessionMode::Council))
            .await
            .unwrap();
        assert!(!decision.advance_phase);

        let two_turns = vec![
            Message::persona("nova".into(), "a"),
            Message::persona("atlas".into(), "b"),
        ];
        let decision = policy
            .decide(input(&two_turns, &active, &registry, SessionMode::Council))
            .await
            .unwrap();
        assert!(decision.advance_phase);
    }
}
