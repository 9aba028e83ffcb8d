//! Append-only API usage log.
//!
//! Every attempt made by the generation service (success, error, rate-limit
//! wait) becomes one [`UsageRecord`]. The most recent records are kept in
//! memory for inspection and, when a path is configured, appended to a
//! plain-text file that rotates at [`DEFAULT_MAX_BYTES`].

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Rotate once the log would grow past 5 MiB
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Rotated files kept as `<log>.1` .. `<log>.N`
pub const DEFAULT_BACKUPS: u32 = 3;

/// Records retained in memory; older ones are only in the file sink
pub const DEFAULT_MAX_RECORDS: usize = 1000;

const MAX_ERROR_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum UsageOutcome {
    Success {
        /// `None` when the tokenizer call failed
        input_tokens: Option<u64>,
        output_tokens: u64,
        latency: Duration,
        total_requests: u64,
    },
    Error {
        attempt: u32,
        max_attempts: u32,
        latency: Duration,
        error: String,
    },
    RateLimited {
        wait: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub timestamp: DateTime<Local>,
    pub caller: String,
    pub outcome: UsageOutcome,
}

impl UsageRecord {
    #[must_use]
    pub fn new(caller: impl Into<String>, outcome: UsageOutcome) -> Self {
        Self {
            timestamp: Local::now(),
            caller: caller.into(),
            outcome,
        }
    }

    /// Render as a single log line (without trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        let prefix = format!(
            "{} | {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.caller
        );
        match &self.outcome {
            UsageOutcome::Success {
                input_tokens,
                output_tokens,
                latency,
                total_requests,
            } => {
                let input = input_tokens.map_or_else(|| "-1".to_string(), |n| n.to_string());
                format!(
                    "{prefix} | SUCCESS | in:{input} | out:~{output_tokens} | latency:{:.1}s | total_reqs:{total_requests}",
                    latency.as_secs_f64()
                )
            }
            UsageOutcome::Error {
                attempt,
                max_attempts,
                latency,
                error,
            } => {
                let error: String = error.chars().take(MAX_ERROR_CHARS).collect();
                format!(
                    "{prefix} | ERROR | attempt:{attempt}/{max_attempts} | latency:{:.1}s | error:{error}",
                    latency.as_secs_f64()
                )
            }
            UsageOutcome::RateLimited { wait } => {
                format!("{prefix} | RATE_LIMITED | waiting:{}s", wait.as_secs())
            }
        }
    }
}

/// Bounded in-memory record list plus an optional rotating file sink.
#[derive(Debug)]
pub struct UsageLog {
    path: Option<PathBuf>,
    max_bytes: u64,
    backups: u32,
    max_records: usize,
    records: Mutex<VecDeque<UsageRecord>>,
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl UsageLog {
    /// Keep records in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            max_bytes: DEFAULT_MAX_BYTES,
            backups: DEFAULT_BACKUPS,
            max_records: DEFAULT_MAX_RECORDS,
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Also append every record to `path`.
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::in_memory()
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, max_bytes: u64, backups: u32) -> Self {
        self.max_bytes = max_bytes;
        self.backups = backups;
        self
    }

    /// Keep at most `max_records` records in memory.
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one attempt. File errors are logged and otherwise ignored.
    pub fn append(&self, record: UsageRecord) {
        if let Some(path) = &self.path {
            let line = record.to_line();
            if let Err(e) = self.write_line(path, &line) {
                warn!(path = %path.display(), error = %e, "Failed to write usage log");
            }
        }
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.max_records == 0 {
            return;
        }
        while records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Snapshot of the retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<UsageRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn write_line(&self, path: &Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let incoming = line.len() as u64 + 1;
        if let Ok(meta) = fs::metadata(path)
            && meta.len() > 0
            && meta.len() + incoming > self.max_bytes
        {
            self.rotate(path)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }

    fn rotate(&self, path: &Path) -> std::io::Result<()> {
        if self.backups == 0 {
            return fs::remove_file(path);
        }
        let oldest = backup_path(path, self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = backup_path(path, index);
            if from.exists() {
                fs::rename(&from, backup_path(path, index + 1))?;
            }
        }
        fs::rename(path, backup_path(path, 1))
    }
}

fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}
