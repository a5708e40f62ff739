//! Directory-backed session store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<session id>/session.json     metadata
//! <root>/<session id>/messages.jsonl   one message per line, append order
//! ```
//!
//! Whole-file writes go to a temporary sibling and are renamed into place,
//! so a crash never leaves a half-written file behind.

use agora_application::ports::session_store::{SessionStore, StoreError};
use agora_domain::{Message, Session, SessionId};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";
const MESSAGES_FILE: &str = "messages.jsonl";

/// File system session store
pub struct JsonFileSessionStore {
    root: PathBuf,
    // serializes writers; readers see either the old or the new file
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, id: &SessionId) -> Result<PathBuf, StoreError> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Io(format!("invalid session id: {raw:?}")));
        }
        Ok(self.root.join(raw))
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, contents).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_error)
    }

    fn encode_log(messages: &[Message]) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        for message in messages {
            serde_json::to_writer(&mut out, message).map_err(serde_error)?;
            out.push(b'\n');
        }
        Ok(out)
    }

    async fn read_session(path: &Path) -> Result<Option<Session>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(serde_error),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

fn serde_error(e: serde_json::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn load_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let path = self.session_dir(id)?.join(SESSION_FILE);
        Self::read_session(&path).await
    }

    async fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.session_dir(&session.id)?.join(SESSION_FILE);
        let json = serde_json::to_vec_pretty(session).map_err(serde_error)?;
        let _guard = self.write_lock.lock().await;
        Self::write_atomic(&path, &json).await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let dir = self.session_dir(id)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path().join(SESSION_FILE);
            match Self::read_session(&path).await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable session at {}: {}", path.display(), e),
            }
        }
        Ok(sessions)
    }

    async fn load_messages(&self, id: &SessionId) -> Result<Vec<Message>, StoreError> {
        let path = self.session_dir(id)?.join(MESSAGES_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut messages = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(message) => messages.push(message),
                // a torn final line from a crash mid-append is dropped
                Err(e) => warn!(
                    "Skipping malformed line {} in {}: {}",
                    index + 1,
                    path.display(),
                    e
                ),
            }
        }
        Ok(messages)
    }

    async fn append_message(&self, id: &SessionId, message: &Message) -> Result<(), StoreError> {
        let dir = self.session_dir(id)?;
        let mut line = serde_json::to_vec(message).map_err(serde_error)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(dir.join(MESSAGES_FILE))
            .await
            .map_err(io_error)?;
        if !ends_with_newline(&mut file).await.map_err(io_error)? {
            // terminate a torn line so it does not swallow this message
            warn!("Terminating torn last line in the log of session {}", id);
            line.insert(0, b'\n');
        }
        file.write_all(&line).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        debug!("Appended message {} to session {}", message.id, id);
        Ok(())
    }

    async fn replace_messages(
        &self,
        id: &SessionId,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        let path = self.session_dir(id)?.join(MESSAGES_FILE);
        let contents = Self::encode_log(messages)?;
        let _guard = self.write_lock.lock().await;
        Self::write_atomic(&path, &contents).await
    }

    async fn clear_messages(&self, id: &SessionId) -> Result<(), StoreError> {
        self.replace_messages(id, &[]).await
    }
}

/// True when the file is empty or its last byte is a newline
async fn ends_with_newline(file: &mut tokio::fs::File) -> std::io::Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}
