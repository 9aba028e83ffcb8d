//! Atomic file writes for checkpoints and exports.
//!
//! Content goes to a temporary file in the target directory, is fsynced, then
//! renamed over the target. A reader therefore sees either the previous
//! checkpoint or the new one, never a truncated file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Bytes written after line-ending normalization
    pub bytes_written: usize,
    /// Number of rename retries that occurred (Windows only)
    pub rename_retry_count: u32,
    /// Whether the copy fallback was used because temp and target live on different filesystems
    pub used_cross_filesystem_fallback: bool,
}

/// Atomically write `content` to `path`, creating parent directories as needed.
///
/// Line endings are normalized to LF.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the temporary
/// file cannot be written or synced, or the final rename (and its fallback) fails.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let normalized = normalize_line_endings(content);
    let mut result = AtomicWriteResult {
        bytes_written: normalized.len(),
        ..AtomicWriteResult::default()
    };

    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;
    temp_file
        .write_all(normalized.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();

    match atomic_rename(temp_file, path.as_std_path()) {
        Ok(retries) => result.rename_retry_count = retries,
        Err(e) if is_cross_filesystem_error(&e) => {
            result.used_cross_filesystem_fallback = true;
            copy_and_sync(&temp_path, path)?;
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    Ok(result)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Rename with bounded retries; Windows can hold transient locks on freshly written files.
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;

    let mut retry_count = 0;
    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                let retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if !retryable || retry_count >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(persist_error.error));
                }
                thread::sleep(Duration::from_millis(INITIAL_DELAY_MS * 2_u64.pow(retry_count)));
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    temp_file
        .persist(target)
        .map(|_| 0)
        .map_err(|e| anyhow::anyhow!(e.error))
}

fn is_cross_filesystem_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .and_then(std::io::Error::raw_os_error)
        .is_some_and(|code| code == 18) // EXDEV
}

fn copy_and_sync(from: &Path, to: &Utf8Path) -> Result<()> {
    fs::copy(from, to).with_context(|| format!("Failed to copy temporary file to {to}"))?;
    fs::File::open(to)
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to fsync {to}"))?;
    let _ = fs::remove_file(from);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_write_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let target = utf8_dir(&dir).join("nested/state/lore.json");

        let result = write_file_atomic(&target, "{\"a\": 1}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"a\": 1}");
        assert_eq!(result.bytes_written, 8);
        assert!(!result.used_cross_filesystem_fallback);
    }

    #[test]
    fn test_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = utf8_dir(&dir).join("lore.json");

        write_file_atomic(&target, "first version, much longer than the second").unwrap();
        write_file_atomic(&target, "second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }

    #[test]
    fn test_line_endings_normalized() {
        let dir = TempDir::new().unwrap();
        let target = utf8_dir(&dir).join("bible.md");

        write_file_atomic(&target, "# Title\r\n\r\nbody\rend").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "# Title\n\nbody\nend");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let target = utf8_dir(&dir).join("lore.json");

        write_file_atomic(&target, "{}").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
