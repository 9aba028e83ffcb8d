//! Helpers shared by command implementations.

use anyhow::Result;
use camino::Utf8PathBuf;

use crate::{Config, JsonFileStore, LoreError, ProjectState, StoreError};
use lorewright_state::DurableStore;
use lorewright_utils::error::ConfigError;

/// Checkpoint store rooted at the configured state directory.
pub fn open_store(config: &Config) -> Result<JsonFileStore> {
    let root = Utf8PathBuf::from_path_buf(config.paths.state_dir.clone()).map_err(|path| {
        LoreError::Config(ConfigError::InvalidValue {
            key: "state_dir".to_string(),
            value: format!("{} is not valid UTF-8", path.display()),
        })
    })?;
    Ok(JsonFileStore::new(root))
}

/// Load and interpret a saved project.
pub fn load_project(store: &JsonFileStore, project: &str) -> Result<ProjectState> {
    let document = store.load(project).map_err(LoreError::Store)?;
    let state = ProjectState::from_document(document).map_err(|e| {
        LoreError::Store(StoreError::Corrupt {
            id: project.to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(state)
}
