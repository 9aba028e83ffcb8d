//! The resumable phase state machine.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{Instrument, info, warn};

use lorewright_llm::{GenerationConfig, GenerationService};
use lorewright_phases::{PHASES, PhaseHandler, PhaseOutcome, VarietyInjector};
use lorewright_state::{DurableStore, ProjectState};
use lorewright_utils::error::{LoreError, StoreError};
use lorewright_utils::logging::{
    log_checkpoint_failed, log_phase_complete, log_phase_degraded, log_phase_skipped,
    log_phase_start, phase_span,
};
use lorewright_utils::types::{Phase, PhaseCounts, RunStatus};

use crate::request::{GenerationOutcome, GenerationRequest};

/// Sequences the five phases over one project state.
///
/// Phases run strictly in order. A phase already in the completed set is
/// skipped without a call. A phase that degrades stays incomplete and the
/// pipeline moves on, so the next run retries it. A checkpoint is saved after
/// every phase and at completion.
pub struct LoreOrchestrator<'a> {
    service: &'a GenerationService,
    store: &'a dyn DurableStore,
    injector: &'a VarietyInjector,
    config: GenerationConfig,
    rng_seed: Option<u64>,
}

impl<'a> LoreOrchestrator<'a> {
    pub fn new(
        service: &'a GenerationService,
        store: &'a dyn DurableStore,
        injector: &'a VarietyInjector,
        config: GenerationConfig,
    ) -> Self {
        Self {
            service,
            store,
            injector,
            config,
            rng_seed: None,
        }
    }

    /// Draw variety seeds from a fixed RNG seed instead of OS entropy.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Run the pipeline for `request`.
    ///
    /// Never fails: an uninterpretable existing state or an unexpected
    /// internal error is reported as an `ERROR` outcome.
    pub async fn start(&self, request: GenerationRequest) -> GenerationOutcome {
        let fallback_state = request.existing_state.clone().unwrap_or_default();
        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Lore generation aborted");
                GenerationOutcome {
                    status: RunStatus::Error,
                    phase: Phase::NotStarted,
                    state: fallback_state,
                    degraded: Vec::new(),
                    usage: self.service.usage_stats(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Load the project's checkpoint from the store and continue from it.
    ///
    /// A missing or unreadable checkpoint is logged and the run starts fresh.
    pub async fn resume(
        &self,
        project_name: &str,
        counts: PhaseCounts,
        stop_after: Option<Phase>,
    ) -> GenerationOutcome {
        let mut request = GenerationRequest::new(project_name)
            .with_counts(counts)
            .stop_after(stop_after);

        match self.store.load(project_name) {
            Ok(document) => {
                info!(project = %project_name, "Resuming from checkpoint");
                request = request.with_existing_state(document);
            }
            Err(StoreError::NotFound { .. }) => {
                info!(project = %project_name, "No checkpoint found, starting fresh");
            }
            Err(e) => {
                warn!(project = %project_name, error = %e, "Checkpoint load failed, starting fresh");
            }
        }

        self.start(request).await
    }

    async fn run(&self, request: GenerationRequest) -> Result<GenerationOutcome, LoreError> {
        let GenerationRequest {
            project_name,
            counts,
            stop_after,
            existing_state,
        } = request;

        let mut state = match existing_state {
            Some(document) => {
                info!(project = %project_name, "Resuming from existing state");
                ProjectState::from_document(document)
                    .map_err(|e| LoreError::Generation(format!("existing state is invalid: {e}")))?
            }
            None => ProjectState::default(),
        };

        if !state.set_project_name(&project_name) {
            warn!(
                requested = %project_name,
                kept = %state.project_name(),
                "Project name already set; keeping the recorded name"
            );
        }

        if let Some(phase) = stop_after.filter(|p| !p.is_generative()) {
            warn!(stop_after = %phase, "stop_after must name a generative phase; ignoring");
        }

        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds = self.injector.get_generation_seeds(&mut rng);
        state.set_variety_seeds(seeds.snapshot());
        info!(
            project = %project_name,
            cultures = ?seeds.name_cultures,
            emotion = %seeds.emotion_seed,
            "Using variety seeds"
        );

        let handler = PhaseHandler::new(self.service, self.config);
        let mut degraded = Vec::new();

        for spec in &PHASES {
            let phase = spec.phase;
            let label = phase.as_str();

            let skipped = state.is_phase_completed(phase);
            if skipped {
                log_phase_skipped(&project_name, label);
            } else {
                state.set_current_phase(phase);
                let count = counts.for_phase(phase);
                let span = phase_span(&project_name, label);
                log_phase_start(&project_name, label, count);
                let started = Instant::now();

                let outcome = handler
                    .run(spec, &mut state, &seeds, count)
                    .instrument(span)
                    .await;

                let elapsed = started.elapsed().as_millis();
                match outcome {
                    PhaseOutcome::Produced(_) => log_phase_complete(&project_name, label, elapsed),
                    PhaseOutcome::Degraded { reason, .. } => {
                        log_phase_degraded(&project_name, label, &reason.to_string(), elapsed);
                        degraded.push(phase);
                    }
                }
                self.checkpoint(&project_name, &state);
            }

            if stop_after == Some(phase) && phase != Phase::Routes {
                if skipped {
                    // Seeds and name changed even though no phase ran.
                    self.checkpoint(&project_name, &state);
                }
                info!(project = %project_name, phase = %label, "Pausing after phase");
                return self.outcome(RunStatus::Paused, phase, &state, degraded);
            }
        }

        state.set_current_phase(Phase::Complete);
        self.checkpoint(&project_name, &state);
        info!(project = %project_name, degraded = degraded.len(), "Lore generation complete");

        self.outcome(RunStatus::Complete, Phase::Complete, &state, degraded)
    }

    fn outcome(
        &self,
        status: RunStatus,
        phase: Phase,
        state: &ProjectState,
        degraded: Vec<Phase>,
    ) -> Result<GenerationOutcome, LoreError> {
        let document = state
            .to_document()
            .map_err(|e| LoreError::Generation(format!("state could not be serialized: {e}")))?;
        Ok(GenerationOutcome {
            status,
            phase,
            state: document,
            degraded,
            usage: self.service.usage_stats(),
            error: None,
        })
    }

    /// Persist `state`; failures are logged and never stop the pipeline.
    fn checkpoint(&self, id: &str, state: &ProjectState) {
        let result = state
            .to_document()
            .map_err(|e| e.to_string())
            .and_then(|document| self.store.save(id, &document).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log_checkpoint_failed(id, &e);
        }
    }
}
