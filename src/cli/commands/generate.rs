//! Generate and resume command implementations
//!
//! Handles `lorewright generate` and `lorewright resume`.

use anyhow::{Context, Result};
use tracing::info;

use super::common::open_store;

use crate::{
    Config, GenerationOutcome, GenerationRequest, JsonFileStore, LoreError, LoreOrchestrator,
    Phase, PhaseCounts, ProjectState, RunStatus, StoreError, VarietyInjector, export_markdown,
};
use lorewright_llm::GenerationConfig;
use lorewright_state::DurableStore;
use lorewright_utils::atomic_write::write_file_atomic;

/// Execute the generate command
pub async fn execute_generate_command(
    project: &str,
    counts: PhaseCounts,
    stop_after: Option<Phase>,
    fresh: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let store = open_store(config)?;

    let mut request = GenerationRequest::new(project)
        .with_counts(counts)
        .stop_after(stop_after);
    if fresh {
        info!(project, "Starting fresh; any saved checkpoint will be replaced");
    } else {
        match store.load(project) {
            Ok(document) => {
                info!(project, path = %store.path_for(project), "Continuing from saved checkpoint");
                request = request.with_existing_state(document);
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(LoreError::Store(e).into()),
        }
    }

    let service = lorewright_llm::from_config(config).map_err(LoreError::from)?;
    let injector = VarietyInjector::from_data_dir(&config.paths.data_dir);
    let orchestrator = LoreOrchestrator::new(
        &service,
        &store,
        &injector,
        GenerationConfig::from_settings(&config.generation),
    );

    let outcome = orchestrator.start(request).await;
    finish_run(project, &outcome, &store, json)
}

/// Execute the resume command
pub async fn execute_resume_command(
    project: &str,
    stop_after: Option<Phase>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let store = open_store(config)?;
    let service = lorewright_llm::from_config(config).map_err(LoreError::from)?;
    let injector = VarietyInjector::from_data_dir(&config.paths.data_dir);
    let orchestrator = LoreOrchestrator::new(
        &service,
        &store,
        &injector,
        GenerationConfig::from_settings(&config.generation),
    );

    let outcome = orchestrator.resume(project, config.counts, stop_after).await;
    finish_run(project, &outcome, &store, json)
}

/// Report the outcome, write the lore bible on completion, and map `ERROR` to a failure.
fn finish_run(
    project: &str,
    outcome: &GenerationOutcome,
    store: &JsonFileStore,
    json: bool,
) -> Result<()> {
    let export_path = if outcome.status == RunStatus::Complete {
        let state = ProjectState::from_document(outcome.state.clone())
            .context("Completed state could not be read back")?;
        let path = store.export_path_for(project);
        write_file_atomic(&path, &export_markdown(&state))
            .with_context(|| format!("Failed to write lore bible to {path}"))?;
        Some(path)
    } else {
        None
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(outcome).context("Failed to render outcome JSON")?;
        println!("{rendered}");
    } else {
        print_summary(project, outcome);
        if let Some(path) = &export_path {
            println!("  Lore bible: {path}");
        }
        if outcome.status != RunStatus::Error {
            println!("  Checkpoint: {}", store.path_for(project));
        }
    }

    match &outcome.error {
        Some(message) if outcome.is_error() => Err(LoreError::Generation(message.clone()).into()),
        _ => Ok(()),
    }
}

fn print_summary(project: &str, outcome: &GenerationOutcome) {
    let marker = match outcome.status {
        RunStatus::Complete => "✓",
        RunStatus::Paused => "⏸",
        RunStatus::Error => "✗",
    };
    println!("{marker} {project}: {} ({})", outcome.status, outcome.phase);

    if !outcome.degraded.is_empty() {
        let names: Vec<&str> = outcome.degraded.iter().map(Phase::as_str).collect();
        println!(
            "  Degraded phases: {} (rerun to retry them)",
            names.join(", ")
        );
    }
    if outcome.status == RunStatus::Paused {
        println!("  Continue with: lorewright resume \"{project}\"");
    }

    let usage = &outcome.usage;
    println!(
        "  Requests: {}  Tokens in/out: {}/{}",
        usage.total_requests, usage.total_input_tokens, usage.total_output_tokens
    );
}
