//! Tracing setup and structured logging helpers.
//!
//! The CLI installs one subscriber at startup. Library crates only emit events
//! through `tracing` macros and never install subscribers themselves.

use tracing::{Level, error, info, span, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("lorewright=debug,info")
            } else {
                EnvFilter::try_new("lorewright=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects debug output for
/// lorewright crates. Events are written to stderr so stdout stays clean for
/// `--json` command output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = default_filter(verbose);

    match format {
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(verbose)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .compact(),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(true),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Span wrapping one phase of one project.
pub fn phase_span(project: &str, phase: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "phase_execution",
        project = %project,
        phase = %phase,
    )
}

pub fn log_phase_start(project: &str, phase: &str, count: u32) {
    info!(
        project = %project,
        phase = %phase,
        count = count,
        "Starting phase"
    );
}

pub fn log_phase_complete(project: &str, phase: &str, duration_ms: u128) {
    info!(
        project = %project,
        phase = %phase,
        duration_ms = %duration_ms,
        "Phase completed"
    );
}

pub fn log_phase_skipped(project: &str, phase: &str) {
    info!(
        project = %project,
        phase = %phase,
        "Phase already completed, skipping"
    );
}

/// Log a phase that produced no artifact; it stays incomplete and is retried on resume.
pub fn log_phase_degraded(project: &str, phase: &str, reason: &str, duration_ms: u128) {
    error!(
        project = %project,
        phase = %phase,
        duration_ms = %duration_ms,
        reason = %reason,
        "Phase produced no artifact"
    );
}

pub fn log_checkpoint_failed(project: &str, error: &str) {
    warn!(
        project = %project,
        error = %error,
        "Checkpoint save failed; continuing without it"
    );
}
