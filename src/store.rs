// Persisted favorites and comments over a small JSON key-value store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{COMMENTS_KEY, FAVORITES_KEY};

/// Synchronous storage of small JSON-serializable values under string keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`. Missing keys and read failures both
    /// surface as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write the raw value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, for tests and hosts without persistence.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON object of key → raw value, loaded on open
/// and rewritten on every set.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("malformed store file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&*values)?)?;
        Ok(())
    }
}

/// Typed access to the persisted favorites id array.
///
/// The engines treat the id set as a read-only input snapshot; this wrapper
/// is where the set is actually owned and mutated.
pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
}

impl FavoritesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the current id set. A missing or malformed value reads as empty.
    pub fn load(&self) -> Vec<String> {
        let Some(raw) = self.store.get(FAVORITES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("malformed favorites value, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.load().iter().any(|f| f == id)
    }

    pub fn save(&self, ids: &[String]) -> Result<()> {
        self.store.set(FAVORITES_KEY, &serde_json::to_string(ids)?)
    }

    /// Add the id if absent, remove it if present; returns the new snapshot.
    pub fn toggle(&self, id: &str) -> Result<Vec<String>> {
        let mut ids = self.load();
        match ids.iter().position(|f| f == id) {
            Some(index) => {
                ids.remove(index);
            }
            None => ids.push(id.to_string()),
        }
        self.save(&ids)?;
        Ok(ids)
    }
}

/// One persisted comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterComment {
    #[serde(rename = "characterId")]
    pub character_id: String,
    pub name: String,
    pub comment: String,
    /// RFC 3339 UTC timestamp.
    pub date: String,
}

/// Typed access to the persisted comment records: append-only except for
/// explicit per-item removal.
pub struct CommentsStore {
    store: Arc<dyn KeyValueStore>,
}

impl CommentsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Vec<CharacterComment> {
        let Some(raw) = self.store.get(COMMENTS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(comments) => comments,
            Err(e) => {
                warn!("malformed comments value, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn for_character(&self, character_id: &str) -> Vec<CharacterComment> {
        self.load()
            .into_iter()
            .filter(|c| c.character_id == character_id)
            .collect()
    }

    /// Append a comment. The commenter name falls back to "Anonymous" when
    /// blank; name and comment are stored trimmed.
    pub fn add(&self, character_id: &str, name: &str, comment: &str) -> Result<()> {
        let name = name.trim();
        let mut comments = self.load();
        comments.push(CharacterComment {
            character_id: character_id.to_string(),
            name: if name.is_empty() {
                "Anonymous".to_string()
            } else {
                name.to_string()
            },
            comment: comment.trim().to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.persist(&comments)
    }

    /// Remove the `index`-th comment of the given character. Comments on
    /// other characters are untouched.
    pub fn remove(&self, character_id: &str, index: usize) -> Result<()> {
        let comments = self.load();
        let (mut matching, others): (Vec<_>, Vec<_>) = comments
            .into_iter()
            .partition(|c| c.character_id == character_id);
        if index < matching.len() {
            matching.remove(index);
        }
        let mut merged = others;
        merged.extend(matching);
        self.persist(&merged)
    }

    fn persist(&self, comments: &[CharacterComment]) -> Result<()> {
        self.store
            .set(COMMENTS_KEY, &serde_json::to_string(comments)?)
    }
}
