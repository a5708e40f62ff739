//! Manage Sessions use case
//!
//! Create, list, open and delete sessions through the persistence
//! synchronizer. Starters for a new session are generated when an artifact
//! client is available, with the built-in list as fallback.

use crate::ports::generation_client::ArtifactClient;
use crate::use_cases::persistence_sync::{PersistenceSynchronizer, SyncError};
use agora_domain::{
    DEFAULT_STARTERS, DomainError, Message, ParticipantRegistry, Session, SessionId,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] SyncError),
}

/// Session lifecycle operations
pub struct SessionCatalog {
    sync: Arc<PersistenceSynchronizer>,
    registry: Arc<ParticipantRegistry>,
    artifacts: Option<Arc<dyn ArtifactClient>>,
}

impl SessionCatalog {
    pub fn new(sync: Arc<PersistenceSynchronizer>, registry: Arc<ParticipantRegistry>) -> Self {
        Self {
            sync,
            registry,
            artifacts: None,
        }
    }

    /// Generate conversation starters for new sessions
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactClient>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// All sessions, most recently active first
    pub async fn list(&self) -> Result<Vec<Session>, CatalogError> {
        let mut sessions = self.sync.list_sessions().await?;
        sessions.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(sessions)
    }

    /// Validate and persist a new session
    pub async fn create(&self, mut session: Session) -> Result<Session, CatalogError> {
        session.validate()?;
        self.registry.resolve(&session.active_participants)?;

        if session.starters.is_empty() {
            session.starters = self.starters_for(&session).await;
        }

        self.sync.save_session_metadata(&session).await?;
        info!(
            "Created {} session {} '{}' with {} participant(s)",
            session.mode,
            session.id,
            session.title,
            session.active_participants.len()
        );
        Ok(session)
    }

    /// Load a session and its chronologically ordered log
    pub async fn open(&self, id: &SessionId) -> Result<(Session, Vec<Message>), CatalogError> {
        let session = self
            .sync
            .load_session_metadata(id)
            .await?
            .ok_or_else(|| CatalogError::SessionNotFound(id.to_string()))?;
        let messages = self.sync.load_all(id).await?;
        Ok((session, messages))
    }

    pub async fn delete(&self, id: &SessionId) -> Result<(), CatalogError> {
        self.sync.delete_session(id).await?;
        info!("Deleted session {}", id);
        Ok(())
    }

    async fn starters_for(&self, session: &Session) -> Vec<String> {
        if let Some(artifacts) = &self.artifacts {
            match artifacts.starters(&session.title, &session.context).await {
                Ok(starters) if !starters.is_empty() => return starters,
                Ok(_) => {}
                Err(e) => warn!("Starter generation failed, using defaults: {}", e),
            }
        }
        DEFAULT_STARTERS.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GenerationError;
    use crate::use_cases::testing::{
        MemoryStore, ScriptedClient, council_registry, council_session,
    };
    use agora_domain::SessionMode;
    use chrono::Duration;

    fn catalog(store: Arc<MemoryStore>) -> SessionCatalog {
        let sync = Arc::new(PersistenceSynchronizer::new(store));
        SessionCatalog::new(sync, Arc::new(council_registry()))
    }

    #[tokio::test]
    async fn test_create_persists_with_default_starters() {
        let store = Arc::new(MemoryStore::default());
        let catalog = catalog(store.clone());

        let created = catalog.create(council_session()).await.unwrap();

        assert_eq!(created.starters.len(), DEFAULT_STARTERS.len());
        assert_eq!(store.session(&created.id), Some(created));
    }

    #[tokio::test]
    async fn test_create_uses_generated_starters() {
        let store = Arc::new(MemoryStore::default());
        let client = ScriptedClient::new();
        *client.starters.lock().unwrap() = Some(Ok(vec!["Pricing?".to_string()]));
        let catalog = catalog(store).with_artifacts(Arc::new(client));

        let created = catalog.create(council_session()).await.unwrap();

        assert_eq!(created.starters, vec!["Pricing?".to_string()]);
    }

    #[tokio::test]
    async fn test_create_falls_back_when_starters_fail() {
        let client = ScriptedClient::new();
        *client.starters.lock().unwrap() = Some(Err(GenerationError::Timeout));
        let catalog = catalog(Arc::new(MemoryStore::default())).with_artifacts(Arc::new(client));

        let created = catalog.create(council_session()).await.unwrap();

        assert_eq!(created.starters[0], DEFAULT_STARTERS[0]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_sessions() {
        let catalog = catalog(Arc::new(MemoryStore::default()));

        let direct = council_session().with_mode(SessionMode::Direct);
        assert!(matches!(
            catalog.create(direct).await,
            Err(CatalogError::Domain(DomainError::InvalidDirectRoster(3)))
        ));

        let unknown = Session::new("Ghosts", vec!["casper".into()]);
        assert!(matches!(
            catalog.create(unknown).await,
            Err(CatalogError::Domain(DomainError::UnknownParticipant(_)))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_last_activity() {
        let store = Arc::new(MemoryStore::default());
        let catalog = catalog(store);

        let mut older = council_session();
        older.title = "Older".to_string();
        older.last_active_at -= Duration::hours(2);
        let newer = council_session();
        catalog.create(older).await.unwrap();
        catalog.create(newer).await.unwrap();

        let titles: Vec<_> = catalog
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Launch".to_string(), "Older".to_string()]);
    }

    #[tokio::test]
    async fn test_open_and_delete() {
        let store = Arc::new(MemoryStore::default());
        let catalog = catalog(store.clone());
        let created = catalog.create(council_session()).await.unwrap();
        catalog
            .sync
            .append(&created.id, Message::human("Hi"))
            .await
            .unwrap();

        let (session, messages) = catalog.open(&created.id).await.unwrap();
        assert_eq!(session.id, created.id);
        assert_eq!(messages.len(), 1);

        catalog.delete(&created.id).await.unwrap();
        assert!(matches!(
            catalog.open(&created.id).await,
            Err(CatalogError::SessionNotFound(_))
        ));
    }
}
