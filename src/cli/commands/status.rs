//! Status command implementation
//!
//! Handles `lorewright status` and `lorewright status --json`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use super::common::{load_project, open_store};

use crate::{Config, Phase, ProjectState};

/// `status --json` payload.
#[derive(Debug, Serialize)]
struct StatusOutput<'a> {
    project_name: &'a str,
    current_phase: Phase,
    completed_phases: Vec<Phase>,
    next_phase: Option<Phase>,
    artifact_counts: BTreeMap<&'static str, usize>,
    checkpoint: String,
}

impl<'a> StatusOutput<'a> {
    fn new(state: &'a ProjectState, checkpoint: String) -> Self {
        Self {
            project_name: state.project_name(),
            current_phase: state.current_phase(),
            completed_phases: state.completed_phases().collect(),
            next_phase: state.next_incomplete_phase(),
            artifact_counts: state.artifact_counts(),
            checkpoint,
        }
    }
}

/// Execute the status command
pub fn execute_status_command(project: &str, json: bool, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let state = load_project(&store, project)?;
    let status = StatusOutput::new(&state, store.path_for(project).to_string());

    if json {
        let rendered =
            serde_json::to_string_pretty(&status).context("Failed to render status JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Status for project: {}", status.project_name);
    println!("  Current phase: {}", status.current_phase);
    println!("  Checkpoint: {}", status.checkpoint);
    println!("\n  Phases:");
    for phase in Phase::GENERATIVE {
        let marker = if state.is_phase_completed(phase) {
            "✓"
        } else {
            "·"
        };
        println!("    {marker} {phase}");
    }
    match status.next_phase {
        Some(next) => println!("\n  Next phase: {next}"),
        None => println!("\n  All phases complete"),
    }

    println!("\n  Artifacts:");
    for (name, count) in &status.artifact_counts {
        println!("    {name}: {count}");
    }
    Ok(())
}
