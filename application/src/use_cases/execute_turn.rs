//! Execute Turn use case
//!
//! Runs one turn: resolve a speaker, generate the reply with retry and
//! backoff, then append the phase event (if any) and the reply. At most one
//! turn runs at a time per executor; a concurrent call gets
//! [`TurnError::Busy`] instead of waiting.
//!
//! The reply is generated before anything is appended, so a failed
//! generation leaves the log untouched.

use crate::config::OrchestratorParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::generation_client::{GenerationClient, ReplyRequest};
use crate::ports::llm_gateway::GenerationError;
use crate::ports::notifier::{NoNotifier, Notifier, Severity};
use crate::ports::turn_progress::{NoTurnProgress, TurnProgress};
use crate::use_cases::decide_next_speaker::{DecisionInput, DecisionPolicy};
use crate::use_cases::persistence_sync::{PersistenceSynchronizer, SyncError};
use agora_domain::{
    DecisionSource, DomainError, Message, ParticipantId, ParticipantRegistry, Phase, PromptTemplate,
    ReplyTone, Session, TurnDecision, TurnPlan, TurnResolution,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors that end a turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("Another turn is already in flight")]
    Busy,

    #[error("Generation failed after {attempts} attempt(s): {source}")]
    Generation {
        attempts: u32,
        source: GenerationError,
    },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] SyncError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Everything a turn reads
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub session: &'a Session,
    pub history: &'a [Message],
    pub registry: &'a ParticipantRegistry,
}

/// How the turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied {
        speaker: ParticipantId,
        nudged: bool,
        interview: bool,
    },
    NoSpeaker,
    Failed(TurnError),
}

/// Result of one turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Messages appended by this turn, as stored, in order
    pub appended: Vec<Message>,
    /// `(from, to)` when the phase advanced
    pub phase_change: Option<(Phase, Phase)>,
    pub decision: Option<TurnDecision>,
    pub outcome: TurnOutcome,
}

impl TurnReport {
    fn without_reply(outcome: TurnOutcome, decision: Option<TurnDecision>) -> Self {
        Self {
            appended: Vec::new(),
            phase_change: None,
            decision,
            outcome,
        }
    }

    /// Collapse the outcome for the loop state machine
    pub fn resolution(&self) -> TurnResolution {
        match &self.outcome {
            TurnOutcome::Replied {
                nudged, interview, ..
            } => TurnResolution::Replied {
                nudged: *nudged,
                interview: *interview,
            },
            TurnOutcome::NoSpeaker => TurnResolution::NoSpeaker,
            TurnOutcome::Failed(_) => TurnResolution::Failed,
        }
    }
}

/// Single-flight turn executor
pub struct TurnExecutor {
    policy: DecisionPolicy,
    client: Arc<dyn GenerationClient>,
    sync: Arc<PersistenceSynchronizer>,
    params: OrchestratorParams,
    lock: Mutex<()>,
    notifier: Arc<dyn Notifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl TurnExecutor {
    pub fn new(
        policy: DecisionPolicy,
        client: Arc<dyn GenerationClient>,
        sync: Arc<PersistenceSynchronizer>,
        params: OrchestratorParams,
    ) -> Self {
        Self {
            policy,
            client,
            sync,
            params,
            lock: Mutex::new(()),
            notifier: Arc::new(NoNotifier),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    /// Execute one turn with default (no-op) progress
    pub async fn execute(
        &self,
        ctx: TurnContext<'_>,
        plan: TurnPlan,
    ) -> Result<TurnReport, TurnError> {
        self.execute_with_progress(ctx, plan, &NoTurnProgress).await
    }

    /// Execute one turn with progress callbacks.
    ///
    /// Returns `Err(TurnError::Busy)` when a turn is already running; every
    /// other failure is reported through [`TurnOutcome::Failed`].
    pub async fn execute_with_progress(
        &self,
        ctx: TurnContext<'_>,
        plan: TurnPlan,
        progress: &dyn TurnProgress,
    ) -> Result<TurnReport, TurnError> {
        let _turn = self.lock.try_lock().map_err(|_| TurnError::Busy)?;

        let session = ctx.session;
        let nudged = plan.forced_speaker.is_some();
        let interview = plan.interview;

        // 1. Who speaks
        let decision = match self.resolve_speaker(ctx, &plan).await {
            Ok(decision) => decision,
            Err(e) => return Ok(self.fail(session, e, None, 0)),
        };
        let Some(speaker) = decision.next_speaker.clone() else {
            warn!("No speaker available for session {}", session.id);
            self.notifier
                .notify("No participant is available to speak.", Severity::Warning);
            return Ok(TurnReport::without_reply(TurnOutcome::NoSpeaker, Some(decision)));
        };
        if decision.source == DecisionSource::Fallback {
            self.conversation_logger.log(ConversationEvent::new(
                "speaker_fallback",
                json!({
                    "session_id": session.id.as_str(),
                    "speaker": speaker.as_str(),
                    "rationale": decision.rationale,
                }),
            ));
        }
        let Some(participant) = ctx.registry.get(speaker.as_str()) else {
            let e = DomainError::UnknownParticipant(speaker.to_string()).into();
            return Ok(self.fail(session, e, Some(decision), 0));
        };
        progress.on_speaker_selected(&decision);

        // Interview turns never move the phase
        let phase_change = if interview {
            None
        } else {
            decision
                .next_phase(session.phase)
                .map(|next| (session.phase, next))
        };
        let reply_phase = phase_change.map(|(_, to)| to).unwrap_or(session.phase);

        // 2. Generate
        let request = ReplyRequest {
            participant,
            history: ctx.history,
            registry: ctx.registry,
            context: &session.context,
            summary: session.summary.as_deref(),
            phase: reply_phase,
            tone: if interview {
                ReplyTone::Interview
            } else {
                ReplyTone::Default
            },
        };
        let (text, attempts) = match self.generate_with_retry(request, progress).await {
            Ok(generated) => generated,
            Err(TurnError::Generation { attempts, source }) => {
                let e = TurnError::Generation { attempts, source };
                return Ok(self.fail(session, e, Some(decision), attempts));
            }
            Err(e) => return Ok(self.fail(session, e, Some(decision), 0)),
        };

        // 3. Append: phase event first, then the reply
        let mut appended = Vec::with_capacity(2);
        if let Some((from, to)) = phase_change {
            match self
                .sync
                .append(&session.id, Message::phase_changed(from, to, false))
                .await
            {
                Ok(stored) => appended.push(stored),
                Err(e) => {
                    return Ok(self.fail(session, e.into(), Some(decision), attempts));
                }
            }
            info!("Session {} advanced from {} to {}", session.id, from, to);
            self.conversation_logger.log(ConversationEvent::new(
                "phase_changed",
                json!({
                    "session_id": session.id.as_str(),
                    "from": from.as_str(),
                    "to": to.as_str(),
                    "manual": false,
                }),
            ));
            self.notifier
                .notify("Phase advanced. The debate continues...", Severity::Info);
        }

        let reply = Message::persona(speaker.clone(), text).with_rationale(decision.rationale.clone());
        let stored = match self.sync.append(&session.id, reply).await {
            Ok(stored) => stored,
            Err(e) => {
                let mut report = self.fail(session, e.into(), Some(decision), attempts);
                report.appended = appended;
                report.phase_change = phase_change;
                return Ok(report);
            }
        };

        info!(
            "{} replied in session {}: {}",
            participant.name,
            session.id,
            PromptTemplate::preview(&stored.text)
        );
        self.conversation_logger.log(ConversationEvent::new(
            "turn_completed",
            json!({
                "session_id": session.id.as_str(),
                "message_id": stored.id.as_str(),
                "speaker": speaker.as_str(),
                "source": decision.source,
                "rationale": decision.rationale,
                "phase": reply_phase.as_str(),
                "attempts": attempts,
                "interview": interview,
            }),
        ));
        appended.push(stored);

        Ok(TurnReport {
            appended,
            phase_change,
            decision: Some(decision),
            outcome: TurnOutcome::Replied {
                speaker,
                nudged,
                interview,
            },
        })
    }

    async fn resolve_speaker(
        &self,
        ctx: TurnContext<'_>,
        plan: &TurnPlan,
    ) -> Result<TurnDecision, TurnError> {
        let session = ctx.session;
        if let Some(forced) = &plan.forced_speaker {
            let speaker = session.require_active(forced.as_str())?;
            return Ok(TurnDecision::nudged(speaker));
        }
        Ok(self
            .policy
            .decide(DecisionInput {
                history: ctx.history,
                active: &session.active_participants,
                registry: ctx.registry,
                context: &session.context,
                phase: session.phase,
                mode: session.mode,
                interview: plan.interview,
            })
            .await?)
    }

    /// Generate with exponential backoff on transient failures.
    ///
    /// Returns the text and the number of attempts used.
    async fn generate_with_retry(
        &self,
        request: ReplyRequest<'_>,
        progress: &dyn TurnProgress,
    ) -> Result<(String, u32), TurnError> {
        let max_attempts = self.params.retry_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.client.generate_reply(request).await {
                Ok(text) => return Ok((text, attempt)),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.params.retry_delay(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed ({}); retrying in {:?}",
                        attempt, max_attempts, request.participant.id, e, delay
                    );
                    progress.on_retry(attempt, delay, &e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(TurnError::Generation {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// Log, notify once, and build the failure report
    fn fail(
        &self,
        session: &Session,
        error: TurnError,
        decision: Option<TurnDecision>,
        attempts: u32,
    ) -> TurnReport {
        warn!("Turn failed in session {}: {}", session.id, error);
        let notice = match &error {
            TurnError::Generation { source, .. } if source.is_transient() => {
                "The generation service is overloaded. Send a message to try again.".to_string()
            }
            TurnError::Generation { source, .. } => format!("Generation failed: {}", source),
            TurnError::Persistence(e) => format!("Could not save the reply: {}", e),
            other => format!("Turn failed: {}", other),
        };
        self.notifier.notify(&notice, Severity::Error);
        self.conversation_logger.log(ConversationEvent::new(
            "turn_failed",
            json!({
                "session_id": session.id.as_str(),
                "error": error.to_string(),
                "attempts": attempts,
            }),
        ));
        TurnReport::without_reply(TurnOutcome::Failed(error), decision)
    }
}
