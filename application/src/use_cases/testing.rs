//! Shared fakes for use case tests.

use crate::ports::generation_client::{ArtifactClient, GenerationClient, ReplyRequest, RouterRequest};
use crate::ports::llm_gateway::GenerationError;
use crate::ports::notifier::{Notifier, Severity};
use crate::ports::session_store::{SessionStore, StoreError};
use agora_domain::{
    ActionPlan, Message, Participant, ParticipantRegistry, Session, SessionId, SpeakerProposal,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// ==================== Session store ====================

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    logs: Mutex<HashMap<SessionId, Vec<Message>>>,
    pub offline: AtomicBool,
}

impl MemoryStore {
    pub fn messages(&self, id: &SessionId) -> Vec<Message> {
        self.logs.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        self.check()?;
        Ok(self.session(id))
    }

    async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.check()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        self.check()?;
        self.sessions.lock().unwrap().remove(id);
        self.logs.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.check()?;
        Ok(self.sessions.lock().unwrap().values().cloned().collect())
    }

    async fn load_messages(&self, id: &SessionId) -> Result<Vec<Message>, StoreError> {
        self.check()?;
        Ok(self.messages(id))
    }

    async fn append_message(&self, id: &SessionId, message: &Message) -> Result<(), StoreError> {
        self.check()?;
        self.logs
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn replace_messages(
        &self,
        id: &SessionId,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        self.check()?;
        self.logs
            .lock()
            .unwrap()
            .insert(id.clone(), messages.to_vec());
        Ok(())
    }

    async fn clear_messages(&self, id: &SessionId) -> Result<(), StoreError> {
        self.check()?;
        self.logs.lock().unwrap().remove(id);
        Ok(())
    }
}

// ==================== Generation ====================

/// Generation client that replays scripted router and reply results.
///
/// An exhausted router script answers with an error (so the policy falls
/// back); an exhausted reply script answers `"reply from <id>"`.
#[derive(Default)]
pub struct ScriptedClient {
    routes: Mutex<VecDeque<Result<SpeakerProposal, GenerationError>>>,
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    pub reply_calls: AtomicUsize,
    pub router_calls: AtomicUsize,
    pub last_tone: Mutex<Option<agora_domain::ReplyTone>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub reply_delay: Option<std::time::Duration>,
    pub plan: Mutex<Option<Result<ActionPlan, GenerationError>>>,
    pub starters: Mutex<Option<Result<Vec<String>, GenerationError>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routes(self, routes: Vec<Result<SpeakerProposal, GenerationError>>) -> Self {
        *self.routes.lock().unwrap() = routes.into();
        self
    }

    pub fn with_replies(self, replies: Vec<Result<String, GenerationError>>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    pub fn with_reply_delay(mut self, delay: std::time::Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    pub fn route_to(id: &str) -> Result<SpeakerProposal, GenerationError> {
        Ok(SpeakerProposal {
            next_speaker_id: Some(id.to_string()),
            reasoning: format!("{id} fits"),
            advance_phase: false,
        })
    }

    pub fn reply_calls(&self) -> usize {
        self.reply_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn propose_speaker(
        &self,
        _request: RouterRequest<'_>,
    ) -> Result<SpeakerProposal, GenerationError> {
        self.router_calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Other("no route scripted".to_string())))
    }

    async fn generate_reply(&self, request: ReplyRequest<'_>) -> Result<String, GenerationError> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_tone.lock().unwrap() = Some(request.tone);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.reply_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(format!("reply from {}", request.participant.id)))
    }
}

#[async_trait]
impl ArtifactClient for ScriptedClient {
    async fn action_plan(
        &self,
        _history: &[Message],
        _registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<ActionPlan, GenerationError> {
        self.plan.lock().unwrap().take().unwrap_or_else(|| {
            Ok(ActionPlan::from_texts(
                title,
                vec!["First step".to_string(), "Second step".to_string()],
            ))
        })
    }

    async fn summarize(
        &self,
        history: &[Message],
        _registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError> {
        Ok(format!("summary of {} messages", history.len()))
    }

    async fn meeting_minutes(
        &self,
        history: &[Message],
        _registry: &ParticipantRegistry,
        title: &str,
    ) -> Result<String, GenerationError> {
        Ok(format!("# {}\n\n{} messages", title, history.len()))
    }

    async fn refresh_context(
        &self,
        current: &str,
        _history: &[Message],
        _registry: &ParticipantRegistry,
    ) -> Result<String, GenerationError> {
        Ok(format!("{current} (refined)"))
    }

    async fn starters(&self, _title: &str, _context: &str) -> Result<Vec<String>, GenerationError> {
        self.starters
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(vec!["Where do we start?".to_string()]))
    }
}

// ==================== Notifier ====================

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn count(&self, severity: Severity) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s)| *s == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.notices
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

// ==================== Fixtures ====================

pub fn council_registry() -> ParticipantRegistry {
    ParticipantRegistry::from_participants(vec![
        Participant::new("nova", "Nova", "Visionary", "Think big."),
        Participant::new("atlas", "Atlas", "Operator", "Ship it."),
        Participant::new("rex", "Rex", "Investor", "Show numbers."),
    ])
}

pub fn council_session() -> Session {
    Session::new(
        "Launch",
        vec!["nova".into(), "atlas".into(), "rex".into()],
    )
}
