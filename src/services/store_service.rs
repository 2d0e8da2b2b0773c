//! Durable key-value store for the application state.
//!
//! Each logical collection persists as one JSON file under the platform data
//! directory, wrapped in a versioned envelope so a future format change is
//! detected instead of silently mis-parsed. Loading never fails — corrupt or
//! missing data degrades to the caller's fallback. Writing is best-effort.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{default_sources, ChatSession, KnowledgeSource, Message, UsageStats};

/// Current on-disk format version
pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Messages,
    Sources,
    History,
    Usage,
    WelcomeSeen,
}

impl StoreKey {
    pub const ALL: [StoreKey; 5] = [
        StoreKey::Messages,
        StoreKey::Sources,
        StoreKey::History,
        StoreKey::Usage,
        StoreKey::WelcomeSeen,
    ];

    fn file_name(self) -> &'static str {
        match self {
            StoreKey::Messages => "messages.json",
            StoreKey::Sources => "sources.json",
            StoreKey::History => "chat_history.json",
            StoreKey::Usage => "usage_stats.json",
            StoreKey::WelcomeSeen => "welcome_seen.json",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

pub fn get_app_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Store("could not find data directory".to_string()))?
        .join("Bimehyar");

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Handle to the fixed namespace of persisted collections. Owned by the
/// application context; all durable reads and writes go through it.
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn open() -> Result<Self> {
        Ok(Self {
            root: get_app_data_dir()?,
        })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: StoreKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Load the value stored under `key`, or `fallback` when the key is
    /// missing, unreadable, from a different format version, or corrupt.
    pub fn load<T: DeserializeOwned>(&self, key: StoreKey, fallback: T) -> T {
        let path = self.key_path(key);
        if !path.exists() {
            return fallback;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(key = key.file_name(), error = %e, "failed to read stored value, using fallback");
                return fallback;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&content) {
            Ok(envelope) if envelope.version == STORE_VERSION => envelope.data,
            Ok(envelope) => {
                warn!(
                    key = key.file_name(),
                    version = envelope.version,
                    "unsupported stored format version, using fallback"
                );
                fallback
            }
            Err(e) => {
                warn!(key = key.file_name(), error = %e, "failed to parse stored value, using fallback");
                fallback
            }
        }
    }

    /// Serialize `value` and write it under `key`. Persistence is advisory:
    /// failures are logged and swallowed, never surfaced to the session.
    pub fn save<T: Serialize>(&self, key: StoreKey, value: &T) {
        let envelope = Envelope {
            version: STORE_VERSION,
            data: value,
        };

        let content = match serde_json::to_string_pretty(&envelope) {
            Ok(content) => content,
            Err(e) => {
                warn!(key = key.file_name(), error = %e, "failed to serialize value");
                return;
            }
        };

        if let Err(e) = fs::write(self.key_path(key), content) {
            warn!(key = key.file_name(), error = %e, "failed to write stored value");
        }
    }

    /// Remove one key's durable file
    pub fn delete(&self, key: StoreKey) {
        let path = self.key_path(key);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(key = key.file_name(), error = %e, "failed to remove stored value");
            }
        }
    }

    /// Erase every key in the namespace, including the config file holding
    /// the credential. The caller restarts from a clean state afterwards.
    pub fn clear_all(&self) -> Result<()> {
        for key in StoreKey::ALL {
            let path = self.key_path(key);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }

        let config_path = self.root.join("config.json");
        if config_path.exists() {
            fs::remove_file(&config_path)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed accessors, one pair per collection
    // ------------------------------------------------------------------

    pub fn load_messages(&self) -> Vec<Message> {
        self.load(StoreKey::Messages, Vec::new())
    }

    pub fn save_messages(&self, messages: &[Message]) {
        self.save(StoreKey::Messages, &messages);
    }

    pub fn load_sources(&self) -> Vec<KnowledgeSource> {
        self.load(StoreKey::Sources, default_sources())
    }

    pub fn save_sources(&self, sources: &[KnowledgeSource]) {
        self.save(StoreKey::Sources, &sources);
    }

    pub fn load_history(&self) -> Vec<ChatSession> {
        self.load(StoreKey::History, Vec::new())
    }

    pub fn save_history(&self, history: &[ChatSession]) {
        self.save(StoreKey::History, &history);
    }

    pub fn load_usage(&self) -> UsageStats {
        self.load(StoreKey::Usage, UsageStats::new())
    }

    pub fn save_usage(&self, usage: &UsageStats) {
        self.save(StoreKey::Usage, usage);
    }

    pub fn welcome_seen(&self) -> bool {
        self.load(StoreKey::WelcomeSeen, false)
    }

    pub fn mark_welcome_seen(&self) {
        self.save(StoreKey::WelcomeSeen, &true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, StateStore) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::with_root(dir.path());
        (dir, store)
    }

    #[test]
    fn test_round_trip() {
        let (_dir, store) = test_store();

        let messages = vec![Message::user("سلام"), Message::model("درود")];
        store.save_messages(&messages);

        let loaded = store.load_messages();
        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_missing_key_returns_fallback() {
        let (_dir, store) = test_store();
        assert!(store.load_messages().is_empty());
        assert!(!store.welcome_seen());
        // sources fall back to the seeded document
        assert_eq!(store.load_sources().len(), 1);
    }

    #[test]
    fn test_corrupt_value_returns_fallback() {
        let (dir, store) = test_store();
        std::fs::write(dir.path().join("messages.json"), "{not valid json").unwrap();
        assert!(store.load_messages().is_empty());
    }

    #[test]
    fn test_version_mismatch_returns_fallback() {
        let (dir, store) = test_store();
        std::fs::write(
            dir.path().join("messages.json"),
            r#"{"version": 99, "data": []}"#,
        )
        .unwrap();

        let messages = store.load_messages();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_save_is_best_effort() {
        // Writing into a directory that does not exist must not panic
        let store = StateStore::with_root("/nonexistent/bimehyar-test");
        store.save_messages(&[Message::user("hi")]);
    }

    #[test]
    fn test_clear_all_erases_namespace() {
        let (dir, store) = test_store();
        store.save_messages(&[Message::user("hi")]);
        store.mark_welcome_seen();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        store.clear_all().unwrap();

        assert!(!dir.path().join("messages.json").exists());
        assert!(!dir.path().join("welcome_seen.json").exists());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_delete_single_key() {
        let (dir, store) = test_store();
        store.save_history(&[]);
        assert!(dir.path().join("chat_history.json").exists());
        store.delete(StoreKey::History);
        assert!(!dir.path().join("chat_history.json").exists());
    }
}
