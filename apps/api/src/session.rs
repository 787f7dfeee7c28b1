//! Session store.
//!
//! A small key-value JSON file remembering each logged-in user's role
//! between the login call and later role lookups. The whole map is
//! rewritten on every change: serialized to a sibling temp file, then
//! renamed over the original so a crash never leaves half a file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// One stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub role: String,
    pub logged_in_at: i64,
}

/// File-backed session map keyed by username.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    entries: Arc<Mutex<BTreeMap<String, SessionEntry>>>,
}

impl SessionStore {
    /// Opens the store, loading existing sessions. A missing file is an
    /// empty store; an unreadable one is discarded with a warning.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<String, SessionEntry> = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt session file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(SessionStore {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Records a login, replacing any previous session for the user.
    pub async fn record_login(&self, username: &str, role: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            username.to_string(),
            SessionEntry {
                role: role.to_string(),
                logged_in_at: chrono::Utc::now().timestamp(),
            },
        );
        debug!(username, role, "Session recorded");
        self.persist(&entries).await
    }

    pub async fn role(&self, username: &str) -> Option<String> {
        self.entries
            .lock()
            .await
            .get(username)
            .map(|entry| entry.role.clone())
    }

    /// Removes a session. Returns whether one existed.
    pub async fn remove(&self, username: &str) -> Result<bool, SessionError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(username).is_none() {
            return Ok(false);
        }
        debug!(username, "Session removed");
        self.persist(&entries).await?;
        Ok(true)
    }

    // Caller holds the lock, so writers never interleave.
    async fn persist(&self, entries: &BTreeMap<String, SessionEntry>) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let store = SessionStore::open(&path).await.unwrap();
        assert_eq!(store.role("alice").await, None);

        store.record_login("alice", "admin").await.unwrap();
        store.record_login("bob", "cashier").await.unwrap();
        store.record_login("bob", "manager").await.unwrap();

        let reopened = SessionStore::open(&path).await.unwrap();
        assert_eq!(reopened.role("alice").await.as_deref(), Some("admin"));
        assert_eq!(reopened.role("bob").await.as_deref(), Some("manager"));

        // No temp files left behind
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let store = SessionStore::open(&path).await.unwrap();
        store.record_login("alice", "admin").await.unwrap();

        assert!(store.remove("alice").await.unwrap());
        assert!(!store.remove("alice").await.unwrap());

        let reopened = SessionStore::open(&path).await.unwrap();
        assert_eq!(reopened.role("alice").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SessionStore::open(&path).await.unwrap();
        assert_eq!(store.role("alice").await, None);
        store.record_login("alice", "cashier").await.unwrap();
        assert_eq!(store.role("alice").await.as_deref(), Some("cashier"));
    }
}
