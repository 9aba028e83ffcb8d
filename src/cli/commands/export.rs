//! Export command implementation

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::path::Path;

use super::common::{load_project, open_store};

use crate::{Config, export_markdown};
use lorewright_utils::atomic_write::write_file_atomic;

/// Execute the export command
pub fn execute_export_command(project: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let state = load_project(&store, project)?;

    let path = match output {
        Some(path) => Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|p| {
            anyhow::anyhow!("Output path {} is not valid UTF-8", p.display())
        })?,
        None => store.export_path_for(project),
    };

    write_file_atomic(&path, &export_markdown(&state))
        .with_context(|| format!("Failed to write lore bible to {path}"))?;
    println!("✓ Lore bible written to {path}");
    Ok(())
}
