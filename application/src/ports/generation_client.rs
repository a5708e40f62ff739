//! Generation client port
//!
//! The orchestrator's view of the generation service: propose a speaker,
//! generate a persona reply, and build the summary artifacts. Requests
//! borrow the session state so a turn never clones the log.

use crate::ports::llm_gateway::GenerationError;
use agora_domain::{
    ActionPlan, Message, Participant, ParticipantRegistry, Phase, ReplyTone, SessionMode,
    SpeakerProposal,
};
use async_trait::async_trait;

/// Input for a speaker proposal
#[derive(Debug, Clone, Copy)]
pub struct RouterRequest<'a> {
    pub history: &'a [Message],
    pub candidates: &'a [&'a Participant],
    pub registry: &'a ParticipantRegistry,
    pub context: &'a str,
    pub phase: Phase,
    pub mode: SessionMode,
    pub interview: bool,
}

/// Input for a persona reply
#[derive(Debug, Clone, Copy)]
pub struct ReplyRequest<'a> {
    pub participant: &'a Participant,
    pub history: &'a [Message],
    pub registry: &'a ParticipantRegistry,
    pub context: &'a str,
    pub summary: Option<&'a str>,
    pub phase: Phase,
    pub tone: ReplyTone,
}

/// Speaker routing and reply generation
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Ask the router who should speak next
    async fn propose_speaker(
        &self,
        request: RouterRequest<'_>,
    ) -> Result<SpeakerProposal, GenerationError>;

    /// Generate a persona's reply text
    async fn generate_reply(&self, request: ReplyRequest<'_>) -> Result<String, GenerationError>;
}

/// Summary artifacts built from a session's log
#[async_trait]
pub trait ArtifactClient: Send + Sync {
    /// Structured action plan for the discussion so far
    async fn action_plan(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<ActionPlan, GenerationError>;

    /// Dense summary used as long-term memory
    async fn summarize(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError>;

    /// Markdown meeting minutes
    async fn meeting_minutes(
        &self,
        history: &[Message],
        registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<String, GenerationError>;

    /// Rewrite the session context from recent discussion
    async fn refresh_context(
        &self,
        current: &str,
        history: &[Message],
        registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError>;

    /// Suggested opening prompts
    async fn starters(&self, title: &str, context: &str) -> Result<Vec<String>, GenerationError>;
}
