//! Session Controller
//!
//! Owns one session's state machine and drives the autonomous loop from a
//! single task. Commands arrive on a channel and are processed one at a
//! time; a turn runs inline, so a command sent mid-turn is only handled once
//! the turn finishes. Output leaves through a broadcast of [`SessionEvent`]s
//! and a watch of the current [`ConversationStatus`].

use crate::config::OrchestratorParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::generation_client::ArtifactClient;
use crate::ports::llm_gateway::GenerationError;
use crate::ports::notifier::{NoNotifier, Notifier, Severity};
use crate::ports::session_event::SessionEvent;
use crate::ports::turn_progress::TurnProgress;
use crate::use_cases::execute_turn::{TurnContext, TurnError, TurnExecutor, TurnOutcome};
use crate::use_cases::persistence_sync::{PersistenceSynchronizer, Reconciliation, SyncError};
use agora_domain::conversation::log;
use agora_domain::participant::presets::DEFAULT_STARTERS;
use agora_domain::util::reply_quote;
use agora_domain::{
    Attachment, ConversationState, ConversationStatus, DomainError, Message, MessageId,
    ParticipantId, ParticipantRegistry, Phase, Session, SystemEvent, TurnDecision,
    TurnResolution,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Text of the message that carries a generated action plan
pub const ACTION_PLAN_INTRO: &str = "Here is a practical plan based on our discussion:";

const EVENT_CAPACITY: usize = 256;

/// Errors raised while handling a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] SyncError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Session controller has stopped")]
    Closed,
}

/// Point-in-time view of a running session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Session,
    pub messages: Vec<Message>,
    pub status: ConversationStatus,
    pub consecutive_bot_turns: usize,
}

/// Caller-facing control surface
#[derive(Debug)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    SendMessage {
        text: String,
        attachments: Vec<Attachment>,
        reply_to: Option<MessageId>,
    },
    Nudge(ParticipantId),
    ClearHistory,
    RequestInterview,
    RequestActionPlan,
    SetPhase(Phase),
    RegenerateLast,
    EditMessage {
        id: MessageId,
        text: String,
    },
    ToggleActionItem {
        message_id: MessageId,
        item_id: String,
    },
    Summarize,
    RefreshContext,
    RegenerateStarters,
    Reconcile,
    MeetingMinutes(oneshot::Sender<Result<String, ControllerError>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Result of a background summary
struct SummaryDone {
    generation: u64,
    covered: usize,
    result: Result<String, GenerationError>,
}

/// Forwards turn progress to the event broadcast
struct EventProgress<'a> {
    events: &'a broadcast::Sender<SessionEvent>,
}

impl TurnProgress for EventProgress<'_> {
    fn on_speaker_selected(&self, decision: &TurnDecision) {
        if let Some(speaker) = &decision.next_speaker {
            let _ = self.events.send(SessionEvent::SpeakerSelected {
                speaker: speaker.clone(),
                rationale: decision.rationale.clone(),
            });
        }
    }

    fn on_retry(&self, attempt: u32, delay: Duration, error: &GenerationError) {
        debug!("Retry {} scheduled in {:?} after: {}", attempt, delay, error);
    }
}

/// Single-task owner of a session's conversation loop
pub struct SessionController {
    session: Session,
    messages: Vec<Message>,
    state: ConversationState,
    registry: Arc<ParticipantRegistry>,
    executor: TurnExecutor,
    artifacts: Arc<dyn ArtifactClient>,
    sync: Arc<PersistenceSynchronizer>,
    params: OrchestratorParams,
    notifier: Arc<dyn Notifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    events: broadcast::Sender<SessionEvent>,
    status_tx: watch::Sender<ConversationStatus>,
    next_turn_at: Option<Instant>,
    summary_in_flight: bool,
    summarized_upto: usize,
    /// Bumped whenever messages are removed or the log is swapped out
    log_generation: u64,
}

impl SessionController {
    /// Build a controller over a loaded session and its log
    pub fn new(
        session: Session,
        messages: Vec<Message>,
        registry: Arc<ParticipantRegistry>,
        executor: TurnExecutor,
        artifacts: Arc<dyn ArtifactClient>,
        sync: Arc<PersistenceSynchronizer>,
    ) -> Result<Self, ControllerError> {
        session.validate()?;
        registry.resolve(&session.active_participants)?;

        let params = executor.params().clone();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (status_tx, _) = watch::channel(ConversationStatus::Idle);
        let summarized_upto = messages.len();

        Ok(Self {
            session,
            messages,
            state: ConversationState::new(params.safety_valve_cap),
            registry,
            executor,
            artifacts,
            sync,
            params,
            notifier: Arc::new(NoNotifier),
            conversation_logger: Arc::new(NoConversationLogger),
            events,
            status_tx,
            next_turn_at: None,
            summary_in_flight: false,
            summarized_upto,
            log_generation: 0,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Spawn the loop task and return its handle
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let events = self.events.clone();
        let status = self.status_tx.subscribe();
        let join = tokio::spawn(self.run(rx, cancel.clone()));
        SessionHandle {
            commands: tx,
            events,
            status,
            cancel,
            join,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        cancel: CancellationToken,
    ) {
        let (summary_tx, mut summary_rx) = mpsc::unbounded_channel::<SummaryDone>();
        info!(
            "Session {} ({}) controller started with {} messages",
            self.session.id,
            self.session.mode,
            self.messages.len()
        );

        loop {
            let deadline = self.next_turn_at;
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command, &summary_tx).await,
                    None => break,
                },
                Some(done) = summary_rx.recv() => self.on_summary(done).await,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.next_turn_at = None;
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.run_turn() => {}
                    }
                    self.maybe_summarize(&summary_tx);
                }
            }
            self.reschedule();
        }

        info!("Session {} controller stopped", self.session.id);
    }

    // ==================== Scheduling ====================

    fn reschedule(&mut self) {
        if !self.state.status().wants_turn() {
            self.next_turn_at = None;
            return;
        }
        if self.next_turn_at.is_none() {
            let last_was_human = self.messages.last().is_some_and(|m| m.is_from_human());
            let delay = self.params.turn_delay_after(last_was_human);
            self.next_turn_at = Some(Instant::now() + delay);
        }
    }

    fn publish_status(&self) {
        let status = self.state.status();
        let changed = self.status_tx.send_if_modified(|current| {
            if *current != status {
                *current = status;
                true
            } else {
                false
            }
        });
        if changed {
            let _ = self.events.send(SessionEvent::StatusChanged(status));
        }
    }

    // ==================== Turns ====================

    async fn run_turn(&mut self) {
        let Some(plan) = self.state.begin_turn() else {
            return;
        };
        self.publish_status();

        let progress = EventProgress {
            events: &self.events,
        };
        let ctx = TurnContext {
            session: &self.session,
            history: &self.messages,
            registry: &self.registry,
        };
        let resolution = match self.executor.execute_with_progress(ctx, plan, &progress).await {
            Ok(report) => {
                let resolution = report.resolution();
                for message in report.appended {
                    self.messages.push(message.clone());
                    let _ = self.events.send(SessionEvent::MessageAppended(message));
                }
                if let Some((from, to)) = report.phase_change {
                    self.apply_phase(from, to, false).await;
                }
                if let TurnOutcome::Failed(TurnError::Persistence(e)) = &report.outcome {
                    warn!("Reply for session {} was generated but not saved: {}", self.session.id, e);
                }
                resolution
            }
            Err(e) => {
                warn!("Turn for session {} did not start: {}", self.session.id, e);
                TurnResolution::Failed
            }
        };

        let transition = self.state.complete_turn(resolution, self.session.mode);
        if transition.safety_valve_tripped {
            let turns = self.state.consecutive_bot_turns();
            info!(
                "Safety valve paused session {} after {} consecutive turns",
                self.session.id, turns
            );
            self.notifier.notify(
                &format!(
                    "The council paused after {} turns without you. Send a message or resume to continue.",
                    turns
                ),
                Severity::Warning,
            );
            self.conversation_logger.log(ConversationEvent::new(
                "safety_valve",
                json!({
                    "session_id": self.session.id.as_str(),
                    "consecutive_turns": turns,
                }),
            ));
            let _ = self.events.send(SessionEvent::SafetyValveTripped {
                consecutive_turns: turns,
            });
        }
        self.publish_status();
    }

    /// Record a phase change on the session metadata
    async fn apply_phase(&mut self, from: Phase, to: Phase, manual: bool) {
        self.session.phase = to;
        self.session.touch();
        self.save_session().await;
        let _ = self.events.send(SessionEvent::PhaseChanged { from, to, manual });
    }

    async fn save_session(&mut self) {
        if let Err(e) = self.sync.save_session_metadata(&self.session).await {
            warn!("Failed to save session {}: {}", self.session.id, e);
            self.notifier
                .notify(&format!("Could not save the session: {}", e), Severity::Error);
        }
    }

    /// Persist a modified copy of the log, then adopt it
    async fn commit_log(&mut self, messages: Vec<Message>) -> Result<(), ControllerError> {
        self.sync.replace(&self.session.id, messages.clone()).await?;
        self.messages = messages;
        Ok(())
    }

    // ==================== Summaries ====================

    fn maybe_summarize(&mut self, summary_tx: &mpsc::UnboundedSender<SummaryDone>) {
        let interval = self.params.summary_interval;
        if interval == 0 || self.summary_in_flight {
            return;
        }
        if self.messages.len() >= self.summarized_upto + interval {
            self.spawn_summary(summary_tx);
        }
    }

    fn spawn_summary(&mut self, summary_tx: &mpsc::UnboundedSender<SummaryDone>) {
        if self.messages.is_empty() {
            return;
        }
        self.summary_in_flight = true;
        let artifacts = self.artifacts.clone();
        let registry = self.registry.clone();
        let history = self.messages.clone();
        let generation = self.log_generation;
        let tx = summary_tx.clone();
        debug!(
            "Summarizing {} messages of session {}",
            history.len(),
            self.session.id
        );
        tokio::spawn(async move {
            let result = artifacts.summarize(&history, &registry).await;
            let _ = tx.send(SummaryDone {
                generation,
                covered: history.len(),
                result,
            });
        });
    }

    async fn on_summary(&mut self, done: SummaryDone) {
        self.summary_in_flight = false;
        if done.generation != self.log_generation {
            debug!(
                "Dropping summary of session {} taken before the log changed",
                self.session.id
            );
            return;
        }
        match done.result {
            Ok(summary) if !summary.trim().is_empty() => {
                self.summarized_upto = done.covered;
                self.session.summary = Some(summary);
                self.save_session().await;
                let _ = self
                    .events
                    .send(SessionEvent::SessionUpdated(Box::new(self.session.clone())));
            }
            Ok(_) => debug!("Empty summary ignored"),
            Err(e) => warn!("Background summary failed: {}", e),
        }
    }

    // ==================== Commands ====================

    async fn dispatch(
        &mut self,
        command: SessionCommand,
        summary_tx: &mpsc::UnboundedSender<SummaryDone>,
    ) {
        let name = command_name(&command);
        let result = self.handle(command, summary_tx).await;
        if let Err(e) = result {
            warn!("Command {} failed for session {}: {}", name, self.session.id, e);
            self.notifier.notify(&e.to_string(), Severity::Warning);
        }
        self.publish_status();
    }

    async fn handle(
        &mut self,
        command: SessionCommand,
        summary_tx: &mpsc::UnboundedSender<SummaryDone>,
    ) -> Result<(), ControllerError> {
        match command {
            SessionCommand::Start => {
                if self.state.start() {
                    self.next_turn_at = None;
                }
            }
            SessionCommand::Pause => {
                self.state.pause();
                self.next_turn_at = None;
            }
            SessionCommand::Resume => {
                if self.state.resume() {
                    self.next_turn_at = None;
                }
            }
            SessionCommand::SendMessage {
                text,
                attachments,
                reply_to,
            } => {
                self.send_message(text, attachments, reply_to).await?;
                self.maybe_summarize(summary_tx);
            }
            SessionCommand::Nudge(id) => {
                let speaker = self.session.require_active(id.as_str())?;
                info!("Nudging {} in session {}", speaker, self.session.id);
                self.state.nudge(speaker);
                self.next_turn_at = Some(Instant::now());
            }
            SessionCommand::ClearHistory => {
                self.sync.clear(&self.session.id).await?;
                self.messages.clear();
                self.log_generation += 1;
                self.state.clear();
                self.next_turn_at = None;
                self.summarized_upto = 0;
                self.session.summary = None;
                self.save_session().await;
                let _ = self.events.send(SessionEvent::HistoryCleared);
            }
            SessionCommand::RequestInterview => {
                let notice = Message::system(
                    "The user asked the council to interview them.",
                    SystemEvent::InterviewRequested,
                );
                self.append(notice).await?;
                self.state.request_interview();
                self.next_turn_at = None;
            }
            SessionCommand::RequestActionPlan => self.generate_action_plan().await?,
            SessionCommand::SetPhase(phase) => self.set_phase(phase).await?,
            SessionCommand::RegenerateLast => {
                let target = log::regenerate_target(&self.messages)?.id.clone();
                let mut remaining = self.messages.clone();
                remaining.pop();
                self.commit_log(remaining).await?;
                self.log_generation += 1;
                self.summarized_upto = self.summarized_upto.min(self.messages.len());
                let _ = self.events.send(SessionEvent::MessageRemoved(target));
                self.state.regenerate();
                self.next_turn_at = None;
            }
            SessionCommand::EditMessage { id, text } => {
                let mut edited = self.messages.clone();
                log::edit_text(&mut edited, &id, &text)?;
                self.commit_log(edited).await?;
                self.emit_updated(&id);
            }
            SessionCommand::ToggleActionItem {
                message_id,
                item_id,
            } => {
                let mut toggled = self.messages.clone();
                log::toggle_action_item(&mut toggled, &message_id, &item_id)?;
                self.commit_log(toggled).await?;
                self.emit_updated(&message_id);
            }
            SessionCommand::Summarize => {
                if !self.summary_in_flight {
                    self.spawn_summary(summary_tx);
                }
            }
            SessionCommand::RefreshContext => {
                let refreshed = self
                    .artifacts
                    .refresh_context(&self.session.context, &self.messages, &self.registry)
                    .await?;
                self.session.context = refreshed;
                self.save_session().await;
                let _ = self
                    .events
                    .send(SessionEvent::SessionUpdated(Box::new(self.session.clone())));
            }
            SessionCommand::RegenerateStarters => {
                let starters = match self
                    .artifacts
                    .starters(&self.session.title, &self.session.context)
                    .await
                {
                    Ok(starters) if !starters.is_empty() => starters,
                    Ok(_) => default_starters(),
                    Err(e) => {
                        warn!("Starter generation failed, using defaults: {}", e);
                        default_starters()
                    }
                };
                self.session.starters = starters;
                self.save_session().await;
                let _ = self
                    .events
                    .send(SessionEvent::SessionUpdated(Box::new(self.session.clone())));
            }
            SessionCommand::Reconcile => self.reconcile().await?,
            SessionCommand::MeetingMinutes(reply) => {
                let minutes = self
                    .artifacts
                    .meeting_minutes(&self.messages, &self.registry, &self.session.title)
                    .await
                    .map_err(ControllerError::from);
                let _ = reply.send(minutes);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
        Ok(())
    }

    async fn append(&mut self, message: Message) -> Result<(), ControllerError> {
        let stored = self.sync.append(&self.session.id, message).await?;
        self.messages.push(stored.clone());
        let _ = self.events.send(SessionEvent::MessageAppended(stored));
        Ok(())
    }

    async fn send_message(
        &mut self,
        text: String,
        attachments: Vec<Attachment>,
        reply_to: Option<MessageId>,
    ) -> Result<(), ControllerError> {
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }

        let text = match &reply_to {
            Some(id) => {
                let quoted = log::find(&self.messages, id)
                    .ok_or_else(|| DomainError::MessageNotFound(id.to_string()))?;
                let name = self.registry.display_name(&quoted.sender);
                format!("{}{}", reply_quote(&name, &quoted.text), text)
            }
            None => text.to_string(),
        };

        let message = Message::human(text).with_attachments(attachments);
        self.append(message).await?;
        self.conversation_logger.log(ConversationEvent::new(
            "message_appended",
            json!({
                "session_id": self.session.id.as_str(),
                "sender": "user",
                "reply_to": reply_to.as_ref().map(|id| id.as_str()),
            }),
        ));

        self.state.on_human_message();
        self.next_turn_at = None;
        self.session.touch();
        self.save_session().await;
        Ok(())
    }

    async fn set_phase(&mut self, phase: Phase) -> Result<(), ControllerError> {
        let from = self.session.phase;
        if from == phase {
            return Ok(());
        }
        self.append(Message::phase_changed(from, phase, true)).await?;
        info!(
            "Session {} phase set manually from {} to {}",
            self.session.id, from, phase
        );
        self.conversation_logger.log(ConversationEvent::new(
            "phase_changed",
            json!({
                "session_id": self.session.id.as_str(),
                "from": from.as_str(),
                "to": phase.as_str(),
                "manual": true,
            }),
        ));
        self.apply_phase(from, phase, true).await;
        Ok(())
    }

    async fn generate_action_plan(&mut self) -> Result<(), ControllerError> {
        let author = self
            .session
            .active_participants
            .first()
            .cloned()
            .ok_or_else(|| DomainError::UnknownParticipant("<none>".to_string()))?;

        // planning ends autonomous discussion until the human speaks again
        self.state.idle();
        self.next_turn_at = None;
        self.status_tx.send_replace(ConversationStatus::Thinking);
        let _ = self
            .events
            .send(SessionEvent::StatusChanged(ConversationStatus::Thinking));

        let result = self
            .artifacts
            .action_plan(&self.messages, &self.registry, &self.session.title)
            .await;

        let plan = result?;
        info!(
            "Action plan '{}' with {} items for session {}",
            plan.title,
            plan.items.len(),
            self.session.id
        );
        let message = Message::persona(author, ACTION_PLAN_INTRO).with_action_plan(plan);
        self.append(message).await?;
        self.notifier.notify("Action plan created.", Severity::Info);
        Ok(())
    }

    async fn reconcile(&mut self) -> Result<(), ControllerError> {
        match self.sync.reconcile(&self.session.id).await? {
            Reconciliation::ReplacedLocal { session, messages } => {
                if let Some(session) = session {
                    self.session = *session;
                    let _ = self
                        .events
                        .send(SessionEvent::SessionUpdated(Box::new(self.session.clone())));
                }
                self.messages = messages.clone();
                self.log_generation += 1;
                self.summarized_upto = self.summarized_upto.min(self.messages.len());
                let _ = self.events.send(SessionEvent::HistoryReloaded(messages));
            }
            other => debug!("Reconcile of session {}: {:?}", self.session.id, other),
        }
        Ok(())
    }

    fn emit_updated(&self, id: &MessageId) {
        if let Some(message) = log::find(&self.messages, id) {
            let _ = self
                .events
                .send(SessionEvent::MessageUpdated(message.clone()));
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            messages: self.messages.clone(),
            status: self.state.status(),
            consecutive_bot_turns: self.state.consecutive_bot_turns(),
        }
    }
}

fn default_starters() -> Vec<String> {
    DEFAULT_STARTERS.iter().map(|s| s.to_string()).collect()
}

fn command_name(command: &SessionCommand) -> &'static str {
    match command {
        SessionCommand::Start => "start",
        SessionCommand::Pause => "pause",
        SessionCommand::Resume => "resume",
        SessionCommand::SendMessage { .. } => "send_message",
        SessionCommand::Nudge(_) => "nudge",
        SessionCommand::ClearHistory => "clear_history",
        SessionCommand::RequestInterview => "request_interview",
        SessionCommand::RequestActionPlan => "request_action_plan",
        SessionCommand::SetPhase(_) => "set_phase",
        SessionCommand::RegenerateLast => "regenerate_last",
        SessionCommand::EditMessage { .. } => "edit_message",
        SessionCommand::ToggleActionItem { .. } => "toggle_action_item",
        SessionCommand::Summarize => "summarize",
        SessionCommand::RefreshContext => "refresh_context",
        SessionCommand::RegenerateStarters => "regenerate_starters",
        SessionCommand::Reconcile => "reconcile",
        SessionCommand::MeetingMinutes(_) => "meeting_minutes",
        SessionCommand::Snapshot(_) => "snapshot",
    }
}

/// Handle to a running session controller
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Receiver<ConversationStatus>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue a command; fails only when the controller has stopped
    pub fn send(&self, command: SessionCommand) -> Result<(), ControllerError> {
        self.commands
            .send(command)
            .map_err(|_| ControllerError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> ConversationStatus {
        *self.status.borrow()
    }

    pub fn status_watch(&self) -> watch::Receiver<ConversationStatus> {
        self.status.clone()
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(SessionCommand::SendMessage {
            text: text.into(),
            attachments: Vec::new(),
            reply_to: None,
        })
    }

    pub fn nudge(&self, id: impl Into<ParticipantId>) -> Result<(), ControllerError> {
        self.send(SessionCommand::Nudge(id.into()))
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ControllerError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(tx))?;
        rx.await.map_err(|_| ControllerError::Closed)
    }

    pub async fn meeting_minutes(&self) -> Result<String, ControllerError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::MeetingMinutes(tx))?;
        rx.await.map_err(|_| ControllerError::Closed)?
    }

    /// Stop the loop. An in-flight generation call is abandoned.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!("Session controller task ended abnormally: {}", e);
        }
    }
}
