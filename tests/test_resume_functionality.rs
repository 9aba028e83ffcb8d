//! Integration tests for checkpoint and resume behavior
//!
//! Each test drives `LoreOrchestrator` against a `JsonFileStore` in a temp
//! directory with a scripted backend, then builds a second orchestrator over
//! the same directory to simulate a process restart.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use lorewright::{
    DurableStore, GenerationRequest, GenerationService, JsonFileStore, LoreOrchestrator, Phase,
    PhaseCounts, ProjectState, RunStatus, VarietyInjector, export_markdown,
};
use lorewright_llm::{GenerationConfig, LlmBackend, LlmError, LlmInvocation, LlmResult, RetryPolicy};
use lorewright_phases::NamePool;

/// Replies per caller and records every prompt it receives.
#[derive(Clone, Default)]
struct ScriptedBackend {
    replies: Arc<Mutex<HashMap<String, String>>>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
    failures_left: Arc<AtomicU32>,
}

impl ScriptedBackend {
    fn full() -> Self {
        let backend = Self::default();
        backend.reply(
            "era_architect",
            json!({
                "cosmology": {"creation_myth": "The sky was forged from a broken crown"},
                "eras": [
                    {"name": "Age of Cinders", "defining_event": "The Sundering", "what_was_lost": "the old sun"},
                    {"name": "The Grey Accord", "defining_event": "A treaty of ash"}
                ]
            }),
        );
        backend.reply(
            "faction_forge",
            json!({
                "factions": [{"name": "Ember Court", "ideology": "Order through fire"}],
                "territories": [{"name": "Glasswater", "controlled_by": "Ember Court"}]
            }),
        );
        backend.reply(
            "soul_weaver",
            json!({
                "characters": [{"name": "Ilse Varn", "role": "Heir", "faction": "Ember Court"}],
                "relationships": [{"characters": ["Ilse Varn", "Oren"], "type": "rivals"}]
            }),
        );
        backend.reply(
            "conflict_designer",
            json!({
                "conflicts": [{"name": "The Quiet War", "type": "political"}],
                "dilemmas": [{"name": "The Crown or the City"}],
                "moments_of_light": [{"name": "Lanterns at Dusk"}]
            }),
        );
        backend.reply(
            "pathweaver",
            json!({
                "routes": {
                    "light": {"name": "Dawnward", "chapters": [{"number": 1, "title": "Embers"}], "ending": {"title": "A New Sun"}},
                    "shadow": {"name": "Nightfall", "chapters": [], "ending": "The crown is buried"}
                },
                "decision_points": [{"name": "The Gate", "chapter": 2}],
                "hidden_route": {"name": "The Ossuary Path", "unlock_condition": "Spare every rival"}
            }),
        );
        backend
    }

    fn reply(&self, caller: &str, value: serde_json::Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(caller.to_string(), format!("```json\n{value}\n```"));
    }

    fn fail_next(&self, attempts: u32) {
        self.failures_left.store(attempts, Ordering::SeqCst);
    }

    fn calls_for(&self, caller: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == caller)
            .count()
    }

    fn last_prompt(&self, caller: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(c, _)| c == caller)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((inv.caller.clone(), inv.prompt.clone()));

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LlmError::ProviderOutage("503 Service Unavailable".to_string()));
        }

        let reply = self.replies.lock().unwrap().get(&inv.caller).cloned();
        reply
            .map(|text| LlmResult::new(text, "scripted", inv.model))
            .ok_or_else(|| LlmError::Transport(format!("no reply scripted for {}", inv.caller)))
    }
}

fn service(backend: &ScriptedBackend) -> GenerationService {
    let policy = RetryPolicy {
        max_attempts: 2,
        min_call_interval: Duration::ZERO,
        retry_delay: Duration::ZERO,
        ..RetryPolicy::default()
    };
    GenerationService::new(Box::new(backend.clone()), policy)
}

fn store_in(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().to_str().unwrap())
}

fn injector() -> VarietyInjector {
    VarietyInjector::default().with_name_pool(
        "norse",
        NamePool {
            male: vec!["Oren".to_string(), "Hakon".to_string()],
            female: vec!["Ilse".to_string(), "Sigrun".to_string()],
            places: vec!["Frostmere".to_string()],
        },
    )
}

/// Pause after factions, restart with a fresh orchestrator, finish the run.
#[tokio::test]
async fn test_pause_and_resume_across_restart() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = ScriptedBackend::full();
    let injector = injector();

    {
        let service = service(&backend);
        let store = store_in(&dir);
        let orchestrator =
            LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());
        let outcome = orchestrator
            .start(GenerationRequest::new("Ashen Crown").stop_after(Some(Phase::Factions)))
            .await;

        assert_eq!(outcome.status, RunStatus::Paused);
        assert_eq!(outcome.phase, Phase::Factions);
        assert_eq!(outcome.state["completed_phases"], json!(["eras", "factions"]));
        assert_eq!(outcome.state["eras"].as_array().unwrap().len(), 2);
        assert_eq!(outcome.state["factions"].as_array().unwrap().len(), 1);
        assert_eq!(outcome.state["characters"], json!([]));
        assert_eq!(outcome.state["conflicts"], json!([]));
        assert_eq!(outcome.state["routes"]["light"]["name"], json!(""));
        assert_eq!(outcome.state["routes"]["shadow"]["name"], json!(""));
        assert_eq!(outcome.state["decision_points"], json!([]));
        assert_eq!(outcome.state["hidden_routes"], json!([]));
        assert!(store.exists("Ashen Crown"));
        assert!(dir.path().join("Ashen_Crown_lore_state.json").is_file());
    }

    let service = service(&backend);
    let store = store_in(&dir);
    let orchestrator =
        LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());
    let outcome = orchestrator
        .resume("Ashen Crown", PhaseCounts::default(), None)
        .await;

    assert_eq!(outcome.status, RunStatus::Complete);
    assert_eq!(outcome.phase, Phase::Complete);
    assert_eq!(
        outcome.state["completed_phases"],
        json!(["eras", "factions", "characters", "conflicts", "routes"])
    );
    assert_eq!(backend.calls_for("era_architect"), 1);
    assert_eq!(backend.calls_for("faction_forge"), 1);
    assert_eq!(backend.calls_for("soul_weaver"), 1);
    assert_eq!(backend.calls_for("pathweaver"), 1);

    let saved = ProjectState::from_document(store.load("Ashen Crown")?)?;
    assert_eq!(saved.current_phase(), Phase::Complete);
    assert_eq!(saved.completed_phases().count(), 5);
    assert_eq!(saved.eras().len(), 2);
    assert_eq!(saved.hidden_routes().len(), 1);
    assert_eq!(saved.route("shadow").unwrap()["name"], json!("Nightfall"));
    Ok(())
}

/// Later phases see the artifacts produced before the restart.
#[tokio::test]
async fn test_resumed_prompts_carry_earlier_lore() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = ScriptedBackend::full();
    let injector = injector();
    let service = service(&backend);
    let store = store_in(&dir);
    let orchestrator =
        LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());

    orchestrator
        .start(GenerationRequest::new("Ashen Crown").stop_after(Some(Phase::Characters)))
        .await;
    orchestrator
        .resume("Ashen Crown", PhaseCounts::default(), None)
        .await;

    let faction_prompt = backend.last_prompt("faction_forge").unwrap();
    assert!(faction_prompt.contains("Age of Cinders"));

    let conflict_prompt = backend.last_prompt("conflict_designer").unwrap();
    assert!(conflict_prompt.contains("Ember Court"));
    assert!(conflict_prompt.contains("Ilse Varn"));

    let route_prompt = backend.last_prompt("pathweaver").unwrap();
    assert!(route_prompt.contains("=== END LORE ==="));
    assert!(route_prompt.contains("The Quiet War"));
    Ok(())
}

/// A phase that exhausts its attempts stays incomplete and is retried on resume.
#[tokio::test]
async fn test_degraded_phase_is_retried_on_resume() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = ScriptedBackend::full();
    let injector = injector();
    let service = service(&backend);
    let store = store_in(&dir);
    let orchestrator =
        LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());

    backend.fail_next(2);
    let first = orchestrator.start(GenerationRequest::new("Ashen Crown")).await;
    assert_eq!(first.status, RunStatus::Complete);
    assert_eq!(first.degraded, vec![Phase::Eras]);
    assert_eq!(first.state["eras"], json!([]));

    let second = orchestrator
        .resume("Ashen Crown", PhaseCounts::default(), None)
        .await;
    assert_eq!(second.status, RunStatus::Complete);
    assert!(second.degraded.is_empty());
    assert_eq!(backend.calls_for("era_architect"), 3);
    assert_eq!(backend.calls_for("faction_forge"), 1);

    let saved = ProjectState::from_document(store.load("Ashen Crown")?)?;
    assert!(saved.is_phase_completed(Phase::Eras));
    Ok(())
}

/// A state returned by one run can be fed back as `existing_state`.
#[tokio::test]
async fn test_returned_state_round_trips_as_existing_state() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = ScriptedBackend::full();
    let injector = injector();
    let service = service(&backend);
    let store = store_in(&dir);
    let orchestrator =
        LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());

    let paused = orchestrator
        .start(GenerationRequest::new("Ashen Crown").stop_after(Some(Phase::Eras)))
        .await;
    assert_eq!(paused.state, store.load("Ashen Crown")?);

    let resumed = orchestrator
        .start(
            GenerationRequest::new("Ashen Crown")
                .stop_after(Some(Phase::Conflicts))
                .with_existing_state(paused.state),
        )
        .await;
    assert_eq!(resumed.status, RunStatus::Paused);
    assert_eq!(resumed.phase, Phase::Conflicts);
    assert_eq!(backend.calls_for("era_architect"), 1);
    assert_eq!(backend.calls_for("pathweaver"), 0);
    Ok(())
}

/// Export of a completed project contains every section.
#[tokio::test]
async fn test_completed_project_exports_markdown() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = ScriptedBackend::full();
    let injector = injector();
    let service = service(&backend);
    let store = store_in(&dir);
    let orchestrator =
        LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());

    orchestrator.start(GenerationRequest::new("Ashen Crown")).await;
    let state = ProjectState::from_document(store.load("Ashen Crown")?)?;
    let markdown = export_markdown(&state);

    assert!(markdown.starts_with("# Ashen Crown - Game Lore Bible"));
    for heading in [
        "## Cosmology",
        "## Historical Eras",
        "## Factions",
        "## Characters",
        "## Conflicts",
        "## Story Routes",
    ] {
        assert!(markdown.contains(heading), "missing {heading}");
    }
    assert!(markdown.contains("Dawnward"));
    assert!(markdown.contains("Ember Court"));
    Ok(())
}
