//! Token persistence and navigation collaborators.
//!
//! The client keeps its bearer token in memory; persistence across
//! restarts goes through a [`TokenStore`] injected at construction.
//! Both collaborators are optional: a client without a store runs in a
//! pure server context, and a client without a [`NavigationSink`] treats
//! login/logout redirects as no-ops.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use url::Url;

/// Durable keyed store for the bearer token.
///
/// Tokens are opaque strings; the store never inspects them. Writes are
/// fire-and-forget side effects of `set_token` — a failing store is logged
/// and does not fail the in-memory update.
pub trait TokenStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove `key` from the store. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Redirect sink for interactive login/logout flows.
///
/// In a desktop or browser-embedded context this navigates the active
/// page; absent a sink, `auth().login()` does nothing.
pub trait NavigationSink: Send + Sync {
    fn navigate(&self, url: &Url);
}

/// File-backed token store.
///
/// Keeps all keys in a single JSON object file, read-modify-write on
/// every mutation. Suitable for CLI and server-side use.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store tokens in `tokens.json` under `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("tokens.json"),
        }
    }

    /// Store tokens at an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> io::Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "token file is not a JSON object",
            )),
        }
    }

    fn save(&self, map: &Map<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(map.clone()))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.load().ok()?;
        map.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut map = self.load()?;
        let _ = map.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&map)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}

/// In-memory token store for tests and ephemeral contexts.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let _ = self
            .values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let _ = self.values.write().unwrap().remove(key);
        Ok(())
    }
}

/// Navigation sink that records visited URLs instead of navigating.
///
/// Useful for testing login/logout flows without a UI.
#[derive(Debug, Default)]
pub struct RecordingNavigationSink {
    visited: RwLock<Vec<Url>>,
}

impl RecordingNavigationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs navigated to so far, in order.
    pub fn visited(&self) -> Vec<Url> {
        self.visited.read().unwrap().clone()
    }
}

impl NavigationSink for RecordingNavigationSink {
    fn navigate(&self, url: &Url) {
        self.visited.write().unwrap().push(url.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        assert_eq!(store.get("__b44_token__"), None);

        store.set("__b44_token__", "secret").unwrap();
        assert_eq!(store.get("__b44_token__"), Some("secret".to_string()));

        // A second store over the same directory sees the value.
        let other = FileTokenStore::new(temp.path());
        assert_eq!(other.get("__b44_token__"), Some("secret".to_string()));
    }

    #[test]
    fn test_file_store_remove() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);

        // Removing an absent key is fine.
        store.remove("k").unwrap();
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingNavigationSink::new();
        let url: Url = "https://app.example.com/auth/login".parse().unwrap();
        sink.navigate(&url);
        assert_eq!(sink.visited(), vec![url]);
    }
}
