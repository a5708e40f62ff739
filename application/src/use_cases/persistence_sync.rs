//! Persistence synchronizer
//!
//! Every mutation is written to the local store first and awaited; a local
//! failure fails the whole operation. The same mutation is then queued for a
//! background worker that mirrors it to the remote store. Remote failures
//! are logged and mark the session dirty; the next operation that touches a
//! dirty session pushes the full local snapshot instead of the incremental
//! change.
//!
//! On reconcile the remote snapshot is the source of truth and fully replaces
//! the local log, unless local changes are still waiting to be mirrored.

use crate::ports::session_store::{SessionStore, StoreError};
use agora_domain::conversation::log::{clamp_timestamp, sort_chronologically};
use agora_domain::{Message, Session, SessionId};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Errors surfaced by the synchronizer. Only local failures are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Local store error: {0}")]
    Local(#[from] StoreError),
}

/// Outcome of reconciling a session against the remote store
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// No remote store configured, or it was unreachable
    Skipped,
    /// Local data was pushed to the remote store
    PushedLocal,
    /// Local and remote already agreed
    InSync,
    /// The remote snapshot replaced the local cache
    ReplacedLocal {
        session: Option<Box<Session>>,
        messages: Vec<Message>,
    },
}

enum RemoteOp {
    Append(SessionId, Message),
    Replace(SessionId, Vec<Message>),
    Clear(SessionId),
    SaveSession(Box<Session>),
    DeleteSession(SessionId),
    Resync(SessionId),
    Flush(oneshot::Sender<()>),
}

type DirtySet = Arc<Mutex<HashSet<SessionId>>>;

struct RemoteMirror {
    store: Arc<dyn SessionStore>,
    tx: mpsc::UnboundedSender<RemoteOp>,
    dirty: DirtySet,
}

/// Dual-write persistence over a local cache and an optional remote mirror
pub struct PersistenceSynchronizer {
    local: Arc<dyn SessionStore>,
    remote: Option<RemoteMirror>,
    watermarks: Mutex<HashMap<SessionId, DateTime<Utc>>>,
}

impl PersistenceSynchronizer {
    /// Local-only persistence
    pub fn new(local: Arc<dyn SessionStore>) -> Self {
        Self {
            local,
            remote: None,
            watermarks: Mutex::new(HashMap::new()),
        }
    }

    /// Mirror every mutation to `remote` from a background task.
    ///
    /// Must be called within a tokio runtime.
    pub fn with_remote(mut self, remote: Arc<dyn SessionStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dirty: DirtySet = Arc::default();
        tokio::spawn(remote_worker(
            rx,
            self.local.clone(),
            remote.clone(),
            dirty.clone(),
        ));
        self.remote = Some(RemoteMirror {
            store: remote,
            tx,
            dirty,
        });
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Whether local changes for `id` are waiting to be mirrored
    pub fn is_dirty(&self, id: &SessionId) -> bool {
        self.remote.as_ref().is_some_and(|r| {
            r.dirty
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(id)
        })
    }

    fn enqueue(&self, op: RemoteOp) {
        if let Some(remote) = &self.remote
            && remote.tx.send(op).is_err()
        {
            warn!("Remote mirror worker stopped; change not mirrored");
        }
    }

    fn set_watermark(&self, id: &SessionId, ts: Option<DateTime<Utc>>) {
        let mut marks = self.watermarks.lock().unwrap_or_else(PoisonError::into_inner);
        match ts {
            Some(ts) => {
                marks.insert(id.clone(), ts);
            }
            None => {
                marks.remove(id);
            }
        }
    }

    fn watermark(&self, id: &SessionId) -> Option<DateTime<Utc>> {
        self.watermarks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    // ==================== Messages ====================

    /// Append a message, clamping its timestamp so the log stays ordered.
    ///
    /// Returns the message as stored.
    pub async fn append(&self, id: &SessionId, mut message: Message) -> Result<Message, SyncError> {
        let last = match self.watermark(id) {
            Some(ts) => Some(ts),
            None => self
                .local
                .load_messages(id)
                .await?
                .iter()
                .map(|m| m.timestamp)
                .max(),
        };
        if let Some(last) = last
            && message.timestamp < last
        {
            message.timestamp = last;
        }

        self.local.append_message(id, &message).await?;
        self.set_watermark(id, Some(message.timestamp));
        self.enqueue(RemoteOp::Append(id.clone(), message.clone()));
        Ok(message)
    }

    /// The full log from the local cache, oldest first
    pub async fn load_all(&self, id: &SessionId) -> Result<Vec<Message>, SyncError> {
        let mut messages = self.local.load_messages(id).await?;
        sort_chronologically(&mut messages);
        self.set_watermark(id, messages.last().map(|m| m.timestamp));
        Ok(messages)
    }

    /// Replace the whole log (edit, toggle, regenerate)
    pub async fn replace(&self, id: &SessionId, messages: Vec<Message>) -> Result<(), SyncError> {
        let mut ordered: Vec<Message> = Vec::with_capacity(messages.len());
        for mut message in messages {
            clamp_timestamp(&ordered, &mut message);
            ordered.push(message);
        }
        self.local.replace_messages(id, &ordered).await?;
        self.set_watermark(id, ordered.last().map(|m| m.timestamp));
        self.enqueue(RemoteOp::Replace(id.clone(), ordered));
        Ok(())
    }

    pub async fn clear(&self, id: &SessionId) -> Result<(), SyncError> {
        self.local.clear_messages(id).await?;
        self.set_watermark(id, None);
        self.enqueue(RemoteOp::Clear(id.clone()));
        Ok(())
    }

    // ==================== Session metadata ====================

    pub async fn save_session_metadata(&self, session: &Session) -> Result<(), SyncError> {
        self.local.save_session(session).await?;
        self.enqueue(RemoteOp::SaveSession(Box::new(session.clone())));
        Ok(())
    }

    /// Load metadata from the local cache, falling back to the remote store
    pub async fn load_session_metadata(&self, id: &SessionId) -> Result<Option<Session>, SyncError> {
        if let Some(session) = self.local.load_session(id).await? {
            return Ok(Some(session));
        }
        let Some(remote) = &self.remote else {
            return Ok(None);
        };
        match remote.store.load_session(id).await {
            Ok(Some(session)) => {
                info!("Session {} restored from remote store", id);
                self.local.save_session(&session).await?;
                Ok(Some(session))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Remote lookup for session {} failed: {}", id, e);
                Ok(None)
            }
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, SyncError> {
        Ok(self.local.list_sessions().await?)
    }

    pub async fn delete_session(&self, id: &SessionId) -> Result<(), SyncError> {
        self.local.delete_session(id).await?;
        self.set_watermark(id, None);
        self.enqueue(RemoteOp::DeleteSession(id.clone()));
        Ok(())
    }

    // ==================== Reconciliation ====================

    /// Wait until every queued remote write has been attempted
    pub async fn flush(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        if remote.tx.send(RemoteOp::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Bring the local cache and the remote store back in line.
    ///
    /// Dirty sessions push their local snapshot; otherwise the remote
    /// snapshot, when present, replaces the local one.
    pub async fn reconcile(&self, id: &SessionId) -> Result<Reconciliation, SyncError> {
        let Some(remote) = &self.remote else {
            return Ok(Reconciliation::Skipped);
        };

        self.flush().await;
        if self.is_dirty(id) {
            self.enqueue(RemoteOp::Resync(id.clone()));
            self.flush().await;
            return Ok(if self.is_dirty(id) {
                Reconciliation::Skipped
            } else {
                Reconciliation::PushedLocal
            });
        }

        let remote_session = match remote.store.load_session(id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Remote store unreachable for session {}: {}", id, e);
                return Ok(Reconciliation::Skipped);
            }
        };
        let Some(remote_session) = remote_session else {
            // never mirrored
            self.enqueue(RemoteOp::Resync(id.clone()));
            self.flush().await;
            return Ok(Reconciliation::PushedLocal);
        };
        let mut remote_messages = match remote.store.load_messages(id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Remote log unreachable for session {}: {}", id, e);
                return Ok(Reconciliation::Skipped);
            }
        };
        sort_chronologically(&mut remote_messages);

        let local_session = self.local.load_session(id).await?;
        let local_messages = self.load_all(id).await?;
        if local_session.as_ref() == Some(&remote_session) && local_messages == remote_messages {
            return Ok(Reconciliation::InSync);
        }

        info!(
            "Remote snapshot for session {} replaces local cache ({} -> {} messages)",
            id,
            local_messages.len(),
            remote_messages.len()
        );
        self.local.save_session(&remote_session).await?;
        self.local.replace_messages(id, &remote_messages).await?;
        self.set_watermark(id, remote_messages.last().map(|m| m.timestamp));

        Ok(Reconciliation::ReplacedLocal {
            session: Some(Box::new(remote_session)),
            messages: remote_messages,
        })
    }
}

fn mark(dirty: &DirtySet, id: &SessionId, is_dirty: bool) {
    let mut set = dirty.lock().unwrap_or_else(PoisonError::into_inner);
    if is_dirty {
        set.insert(id.clone());
    } else {
        set.remove(id);
    }
}

fn is_marked(dirty: &DirtySet, id: &SessionId) -> bool {
    dirty
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(id)
}

/// Push the full local snapshot of a session to the remote store
async fn resync(
    local: &dyn SessionStore,
    remote: &dyn SessionStore,
    id: &SessionId,
) -> Result<(), StoreError> {
    if let Some(session) = local.load_session(id).await? {
        remote.save_session(&session).await?;
    }
    let messages = local.load_messages(id).await?;
    remote.replace_messages(id, &messages).await
}

async fn remote_worker(
    mut rx: mpsc::UnboundedReceiver<RemoteOp>,
    local: Arc<dyn SessionStore>,
    remote: Arc<dyn SessionStore>,
    dirty: DirtySet,
) {
    while let Some(op) = rx.recv().await {
        let (id, result) = match op {
            RemoteOp::Flush(done) => {
                let _ = done.send(());
                continue;
            }
            RemoteOp::DeleteSession(id) => {
                mark(&dirty, &id, false);
                let result = remote.delete_session(&id).await;
                (id, result)
            }
            RemoteOp::Resync(id) => {
                let result = resync(local.as_ref(), remote.as_ref(), &id).await;
                (id, result)
            }
            op if op_session(&op).is_some_and(|id| is_marked(&dirty, id)) => {
                let Some(id) = op_session(&op).cloned() else {
                    continue;
                };
                debug!("Session {} is dirty; pushing full snapshot", id);
                let result = resync(local.as_ref(), remote.as_ref(), &id).await;
                (id, result)
            }
            RemoteOp::Append(id, message) => {
                let result = remote.append_message(&id, &message).await;
                (id, result)
            }
            RemoteOp::Replace(id, messages) => {
                let result = remote.replace_messages(&id, &messages).await;
                (id, result)
            }
            RemoteOp::Clear(id) => {
                let result = remote.clear_messages(&id).await;
                (id, result)
            }
            RemoteOp::SaveSession(session) => {
                let result = remote.save_session(&session).await;
                (session.id.clone(), result)
            }
        };

        match result {
            Ok(()) => mark(&dirty, &id, false),
            Err(e) => {
                warn!("Remote write for session {} failed: {}", id, e);
                mark(&dirty, &id, true);
            }
        }
    }
    debug!("Remote mirror worker stopped");
}

fn op_session(op: &RemoteOp) -> Option<&SessionId> {
    match op {
        RemoteOp::Append(id, _)
        | RemoteOp::Replace(id, _)
        | RemoteOp::Clear(id)
        | RemoteOp::DeleteSession(id)
        | RemoteOp::Resync(id) => Some(id),
        RemoteOp::SaveSession(session) => Some(&session.id),
        RemoteOp::Flush(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::testing::{MemoryStore, council_session};
    use chrono::Duration;

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>) {
        (Arc::new(MemoryStore::default()), Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_append_is_mirrored() {
        let (local, remote) = stores();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        let session = council_session();
        sync.save_session_metadata(&session).await.unwrap();
        sync.append(&session.id, Message::human("hi")).await.unwrap();
        sync.flush().await;

        assert_eq!(local.messages(&session.id).len(), 1);
        assert_eq!(remote.messages(&session.id).len(), 1);
        assert!(remote.session(&session.id).is_some());
        assert!(!sync.is_dirty(&session.id));
    }

    #[tokio::test]
    async fn test_append_timestamps_never_go_backwards() {
        let (local, _) = stores();
        let sync = PersistenceSynchronizer::new(local.clone());
        let id = SessionId::from("s");

        let mut first = Message::human("first");
        first.timestamp += Duration::seconds(60);
        let first = sync.append(&id, first).await.unwrap();
        let second = sync.append(&id, Message::human("second")).await.unwrap();
        assert!(second.timestamp >= first.timestamp);

        let loaded = sync.load_all(&id).await.unwrap();
        assert_eq!(loaded[0].text, "first");
        assert_eq!(loaded[1].text, "second");
    }

    #[tokio::test]
    async fn test_local_failure_fails_append() {
        let (local, remote) = stores();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        local.set_offline(true);
        let err = sync
            .append(&SessionId::from("s"), Message::human("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Local(StoreError::Unavailable(_))));
        sync.flush().await;
        assert!(remote.messages(&SessionId::from("s")).is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_swallowed_and_resynced_on_next_access() {
        let (local, remote) = stores();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        let session = council_session();
        sync.save_session_metadata(&session).await.unwrap();

        remote.set_offline(true);
        sync.append(&session.id, Message::human("one")).await.unwrap();
        sync.flush().await;
        assert!(sync.is_dirty(&session.id));
        assert_eq!(local.messages(&session.id).len(), 1);

        remote.set_offline(false);
        sync.append(&session.id, Message::human("two")).await.unwrap();
        sync.flush().await;
        assert!(!sync.is_dirty(&session.id));
        let mirrored: Vec<String> = remote
            .messages(&session.id)
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(mirrored, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_reconcile_remote_snapshot_replaces_local() {
        let (local, remote) = stores();
        let session = council_session();
        // remote holds a newer snapshot written elsewhere
        remote.save_session(&session).await.unwrap();
        remote
            .replace_messages(&session.id, &[Message::human("from another device")])
            .await
            .unwrap();
        local.save_session(&session).await.unwrap();
        local
            .replace_messages(&session.id, &[Message::human("stale")])
            .await
            .unwrap();

        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        let outcome = sync.reconcile(&session.id).await.unwrap();
        assert!(matches!(outcome, Reconciliation::ReplacedLocal { .. }));
        let texts: Vec<String> = local
            .messages(&session.id)
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["from another device"]);

        assert_eq!(
            sync.reconcile(&session.id).await.unwrap(),
            Reconciliation::InSync
        );
    }

    #[tokio::test]
    async fn test_reconcile_pushes_dirty_local_first() {
        let (local, remote) = stores();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        let session = council_session();

        remote.set_offline(true);
        sync.save_session_metadata(&session).await.unwrap();
        sync.append(&session.id, Message::human("offline")).await.unwrap();
        sync.flush().await;

        assert_eq!(
            sync.reconcile(&session.id).await.unwrap(),
            Reconciliation::Skipped
        );

        remote.set_offline(false);
        assert_eq!(
            sync.reconcile(&session.id).await.unwrap(),
            Reconciliation::PushedLocal
        );
        assert_eq!(remote.messages(&session.id)[0].text, "offline");
    }

    #[tokio::test]
    async fn test_load_session_falls_back_to_remote() {
        let (local, remote) = stores();
        let session = council_session();
        remote.save_session(&session).await.unwrap();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote);

        let loaded = sync.load_session_metadata(&session.id).await.unwrap();
        assert_eq!(loaded.as_ref().map(|s| &s.id), Some(&session.id));
        assert!(local.session(&session.id).is_some());
    }

    #[tokio::test]
    async fn test_clear_empties_both_stores() {
        let (local, remote) = stores();
        let sync = PersistenceSynchronizer::new(local.clone()).with_remote(remote.clone());
        let id = SessionId::from("s");
        sync.append(&id, Message::human("hi")).await.unwrap();
        sync.clear(&id).await.unwrap();
        sync.flush().await;
        assert!(local.messages(&id).is_empty());
        assert!(remote.messages(&id).is_empty());
    }
}
