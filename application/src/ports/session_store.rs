//! Session store port
//!
//! CRUD on session metadata plus an append-only message log per session.
//! The persistence synchronizer drives two of these: a fast local cache and
//! a durable remote mirror.

use agora_domain::{Message, Session, SessionId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a session store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Port for session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load session metadata; `Ok(None)` when the session does not exist
    async fn load_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Create or overwrite session metadata
    async fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove a session and its log
    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError>;

    /// All stored sessions, in no particular order
    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// The full log, in append order
    async fn load_messages(&self, id: &SessionId) -> Result<Vec<Message>, StoreError>;

    /// Append one message to the log
    async fn append_message(&self, id: &SessionId, message: &Message) -> Result<(), StoreError>;

    /// Replace the whole log (edits, removals, snapshot restores)
    async fn replace_messages(&self, id: &SessionId, messages: &[Message])
    -> Result<(), StoreError>;

    /// Empty the log
    async fn clear_messages(&self, id: &SessionId) -> Result<(), StoreError>;
}
