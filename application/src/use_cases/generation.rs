//! Prompted generation client
//!
//! Implements [`GenerationClient`] and [`ArtifactClient`] on top of a raw
//! [`LlmGateway`] by rendering [`PromptTemplate`]s and parsing structured
//! output.

use crate::config::GenerationParams;
use crate::ports::generation_client::{ArtifactClient, GenerationClient, ReplyRequest, RouterRequest};
use crate::ports::llm_gateway::{CompletionRequest, GenerationError, LlmGateway};
use agora_domain::conversation::log::window;
use agora_domain::{
    ActionPlan, Message, ParticipantRegistry, PromptTemplate, SpeakerProposal,
    parse_action_plan, parse_speaker_proposal, parse_starters,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Text used when the provider returns an empty reply
const EMPTY_REPLY: &str = "...";

/// Generation client backed by prompt templates
pub struct PromptedGenerationClient<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    params: GenerationParams,
}

impl<G: LlmGateway + 'static> PromptedGenerationClient<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Send one request, honoring the configured timeout
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let call = self.gateway.complete(request);
        match self.params.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout)?,
            None => call.await,
        }
    }
}

#[async_trait]
impl<G: LlmGateway + 'static> GenerationClient for PromptedGenerationClient<G> {
    async fn propose_speaker(
        &self,
        request: RouterRequest<'_>,
    ) -> Result<SpeakerProposal, GenerationError> {
        let history = window(request.history, self.params.router_history_window);
        let prompt = PromptTemplate::router_prompt(
            history,
            request.candidates,
            request.registry,
            request.context,
            request.phase,
            request.interview,
        );
        let response = self
            .complete(
                CompletionRequest::new(prompt)
                    .with_system(PromptTemplate::router_system())
                    .json(),
            )
            .await?;
        let proposal = parse_speaker_proposal(&response)?;
        debug!(
            "Router proposed {:?} (advance: {})",
            proposal.next_speaker_id, proposal.advance_phase
        );
        Ok(proposal)
    }

    async fn generate_reply(&self, request: ReplyRequest<'_>) -> Result<String, GenerationError> {
        let history = window(request.history, self.params.reply_history_window);
        let system =
            PromptTemplate::reply_system(request.participant, request.phase, request.tone);
        let prompt = PromptTemplate::reply_prompt(
            history,
            request.registry,
            request.context,
            request.summary,
        );
        let text = self
            .complete(
                CompletionRequest::new(prompt)
                    .with_system(system)
                    .with_temperature(self.params.temperature),
            )
            .await?;

        let text = text.trim();
        Ok(if text.is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text.to_string()
        })
    }
}

#[async_trait]
impl<G: LlmGateway + 'static> ArtifactClient for PromptedGenerationClient<G> {
    async fn action_plan(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<ActionPlan, GenerationError> {
        let prompt = PromptTemplate::action_plan_prompt(history, registry, title);
        let response = self.complete(CompletionRequest::new(prompt).json()).await?;
        Ok(parse_action_plan(&response)?)
    }

    async fn summarize(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError> {
        let prompt = PromptTemplate::summary_prompt(history, registry);
        let summary = self.complete(CompletionRequest::new(prompt)).await?;
        Ok(summary.trim().to_string())
    }

    async fn meeting_minutes(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<String, GenerationError> {
        let prompt = PromptTemplate::minutes_prompt(history, registry, title);
        self.complete(CompletionRequest::new(prompt)).await
    }

    async fn refresh_context(
        &self,
        current: &str,
        history: &[Message],
        registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError> {
        let recent = window(history, self.params.context_history_window);
        let prompt = PromptTemplate::context_refresh_prompt(current, recent, registry);
        let refreshed = self.complete(CompletionRequest::new(prompt)).await?;
        let refreshed = refreshed.trim().trim_matches('"').trim();
        Ok(if refreshed.is_empty() {
            current.to_string()
        } else {
            refreshed.to_string()
        })
    }

    async fn starters(&self, title: &str, context: &str) -> Result<Vec<String>, GenerationError> {
        let prompt = PromptTemplate::starters_prompt(title, context);
        let response = self.complete(CompletionRequest::new(prompt).json()).await?;
        Ok(parse_starters(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::{Participant, Phase, ReplyTone, SessionMode};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Other("No more responses".to_string())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::from_participants(vec![
            Participant::new("luna", "Luna", "Artist", "Think in images."),
            Participant::new("max", "Max", "Engineer", "Be pragmatic."),
        ])
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_ellipsis() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("   ".to_string())]));
        let client = PromptedGenerationClient::new(gateway.clone());
        let registry = registry();
        let luna = registry.get("luna").unwrap();
        let history = vec![Message::human("hello")];

        let reply = client
            .generate_reply(ReplyRequest {
                participant: luna,
                history: &history,
                registry: &registry,
                context: "",
                summary: None,
                phase: Phase::Exploration,
                tone: ReplyTone::Default,
            })
            .await
            .unwrap();
        assert_eq!(reply, "...");

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.7));
        assert!(requests[0].system.as_deref().unwrap().contains("Luna"));
    }

    #[tokio::test]
    async fn test_router_uses_json_and_window() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(
            r#"{"nextSpeakerId": "max", "reasoning": "asked"}"#.to_string(),
        )]));
        let client = PromptedGenerationClient::new(gateway.clone());
        let registry = registry();
        let candidates = registry.all();
        let history: Vec<Message> = (0..30).map(|i| Message::human(format!("msg-{i}"))).collect();

        let proposal = client
            .propose_speaker(RouterRequest {
                history: &history,
                candidates: &candidates,
                registry: &registry,
                context: "",
                phase: Phase::Exploration,
                mode: SessionMode::Council,
                interview: false,
            })
            .await
            .unwrap();
        assert_eq!(proposal.next_speaker_id.as_deref(), Some("max"));

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].format, crate::ports::llm_gateway::ResponseFormat::Json);
        assert!(requests[0].prompt.contains("msg-29"));
        assert!(!requests[0].prompt.contains("msg-19"));
    }

    #[tokio::test]
    async fn test_unparseable_plan_is_malformed() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("no plan today".to_string())]));
        let client = PromptedGenerationClient::new(gateway);
        let err = client
            .action_plan(&[], &registry(), "Launch")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_refresh_context_keeps_current_when_empty() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("\"\"".to_string())]));
        let client = PromptedGenerationClient::new(gateway);
        let refreshed = client
            .refresh_context("Plan a mural", &[], &registry())
            .await
            .unwrap();
        assert_eq!(refreshed, "Plan a mural");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        struct SlowGateway;

        #[async_trait]
        impl LlmGateway for SlowGateway {
            async fn complete(&self, _: CompletionRequest) -> Result<String, GenerationError> {
                tokio::time::sleep(std::time::Duration::from_secs(600)).await;
                Ok("late".to_string())
            }

            fn model_name(&self) -> &str {
                "slow"
            }
        }

        let client = PromptedGenerationClient::new(Arc::new(SlowGateway))
            .with_params(GenerationParams::default().with_timeout_seconds(Some(5)));
        let err = client.summarize(&[], &registry()).await.unwrap_err();
        assert_eq!(err, GenerationError::Timeout);
    }
}
