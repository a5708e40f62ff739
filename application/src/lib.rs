//! Application layer for agora
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{GenerationParams, OrchestratorParams};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    generation_client::{ArtifactClient, GenerationClient, ReplyRequest, RouterRequest},
    llm_gateway::{CompletionRequest, GenerationError, LlmGateway, ResponseFormat},
    notifier::{NoNotifier, Notifier, Severity},
    session_event::SessionEvent,
    session_store::{SessionStore, StoreError},
    turn_progress::{NoTurnProgress, TurnProgress},
};
pub use use_cases::decide_next_speaker::{DecisionInput, DecisionPolicy};
pub use use_cases::execute_turn::{
    TurnContext, TurnError, TurnExecutor, TurnOutcome, TurnReport,
};
pub use use_cases::generation::PromptedGenerationClient;
pub use use_cases::manage_sessions::{CatalogError, SessionCatalog};
pub use use_cases::persistence_sync::{PersistenceSynchronizer, Reconciliation, SyncError};
pub use use_cases::session_controller::{
    ACTION_PLAN_INTRO, ControllerError, SessionCommand, SessionController, SessionHandle,
    SessionSnapshot,
};
