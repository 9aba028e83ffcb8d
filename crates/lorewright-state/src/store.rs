//! Durable checkpoint storage.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use lorewright_utils::atomic_write::write_file_atomic;
use lorewright_utils::error::StoreError;

const STATE_SUFFIX: &str = "_lore_state.json";
const EXPORT_SUFFIX: &str = "_lore_bible.md";

/// Save and load serialized project documents by identifier.
///
/// Implementations must round-trip documents losslessly.
pub trait DurableStore: Send + Sync {
    /// Persist `document` under `id`, replacing any previous checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` when the document cannot be written.
    fn save(&self, id: &str, document: &Value) -> Result<(), StoreError>;

    /// Load the checkpoint stored under `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no checkpoint exists, `ReadFailed` on I/O errors and
    /// `Corrupt` when the stored bytes are not JSON.
    fn load(&self, id: &str) -> Result<Value, StoreError>;
}

/// File-name stem for a project: spaces and path separators become `_`.
#[must_use]
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// Checkpoint file name for a project, e.g. `Ashen_Crown_lore_state.json`.
#[must_use]
pub fn state_file_name(name: &str) -> String {
    format!("{}{STATE_SUFFIX}", sanitize_project_name(name))
}

/// Pretty-printed JSON checkpoints, one file per project, written atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: Utf8PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, id: &str) -> Utf8PathBuf {
        self.root.join(state_file_name(id))
    }

    /// Where the Markdown export for `id` is written.
    #[must_use]
    pub fn export_path_for(&self, id: &str) -> Utf8PathBuf {
        self.root
            .join(format!("{}{EXPORT_SUFFIX}", sanitize_project_name(id)))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }
}

impl DurableStore for JsonFileStore {
    fn save(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        let path = self.path_for(id);
        let write_failed = |reason: String| StoreError::WriteFailed {
            id: id.to_string(),
            reason,
        };

        let mut content =
            serde_json::to_string_pretty(document).map_err(|e| write_failed(e.to_string()))?;
        content.push('\n');

        let result =
            write_file_atomic(&path, &content).map_err(|e| write_failed(format!("{e:#}")))?;
        debug!(path = %path, bytes = result.bytes_written, "Checkpoint saved");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Value, StoreError> {
        let path = self.path_for(id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    id: id.to_string(),
                    path: path.to_string(),
                }
            } else {
                StoreError::ReadFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Process-local store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.documents.lock().ok()?.get(id).cloned()
    }
}

impl DurableStore for MemoryStore {
    fn save(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        let poisoned = || StoreError::WriteFailed {
            id: id.to_string(),
            reason: "store lock poisoned".to_string(),
        };
        self.documents
            .lock()
            .map_err(|_| poisoned())?
            .insert(id.to_string(), document.clone());
        *self.saves.lock().map_err(|_| poisoned())? += 1;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Value, StoreError> {
        let documents = self.documents.lock().map_err(|_| StoreError::ReadFailed {
            id: id.to_string(),
            reason: "store lock poisoned".to_string(),
        })?;
        documents.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
            path: "<memory>".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, JsonFileStore::new(root))
    }

    #[test]
    fn test_state_file_name_sanitized() {
        assert_eq!(state_file_name("Ashen Crown"), "Ashen_Crown_lore_state.json");
        assert_eq!(state_file_name("a/b\\c"), "a_b_c_lore_state.json");
        assert_eq!(state_file_name(""), "_lore_state.json");
    }

    #[test]
    fn test_json_store_round_trip() {
        let (_dir, store) = temp_store();
        let document = json!({
            "project_name": "Ashen Crown",
            "eras": [{"name": "Age of Ash", "is_cataclysm": true}],
            "completed_phases": ["eras"]
        });

        store.save("Ashen Crown", &document).unwrap();
        assert!(store.exists("Ashen Crown"));
        assert_eq!(store.load("Ashen Crown").unwrap(), document);

        let on_disk = std::fs::read_to_string(store.path_for("Ashen Crown")).unwrap();
        assert!(on_disk.contains("\n  \"completed_phases\""));
    }

    #[test]
    fn test_save_replaces_previous_checkpoint() {
        let (_dir, store) = temp_store();
        store.save("x", &json!({"v": 1})).unwrap();
        store.save("x", &json!({"v": 2})).unwrap();
        assert_eq!(store.load("x").unwrap(), json!({"v": 2}));
    }

    #[test]
    fn test_missing_checkpoint_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.load("Nobody").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path_for("broken"), "{ not json").unwrap();
        assert!(matches!(
            store.load("broken").unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn test_export_path_next_to_checkpoint() {
        let store = JsonFileStore::new("saves");
        assert_eq!(
            store.export_path_for("Ashen Crown"),
            Utf8PathBuf::from("saves/Ashen_Crown_lore_bible.md")
        );
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("x"), Err(StoreError::NotFound { .. })));
        store.save("x", &json!({"a": 1})).unwrap();
        store.save("x", &json!({"a": 2})).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.get("x"), Some(json!({"a": 2})));
    }
}
