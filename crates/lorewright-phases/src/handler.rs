//! The generic phase handler.

use std::fmt;
use tracing::{error, info, warn};

use lorewright_extraction::{ParseFailure, normalize};
use lorewright_llm::{CallFailure, GenerationConfig, GenerationService};
use lorewright_state::{ProjectState, Record};

use crate::registry::PhaseSpec;
use crate::variety::GenerationSeeds;

/// Why a phase produced no artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradeReason {
    /// The retry budget ran out
    CallFailed(CallFailure),
    Unparseable(ParseFailure),
    /// The response parsed to `{}`
    Empty,
    MissingKeys(Vec<&'static str>),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallFailed(failure) => write!(f, "{failure}"),
            Self::Unparseable(failure) => write!(f, "{failure}"),
            Self::Empty => write!(f, "response was an empty object"),
            Self::MissingKeys(keys) => write!(f, "response is missing {}", keys.join(", ")),
        }
    }
}

/// Result of running one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    /// The artifact was written and the phase marked complete.
    Produced(Record),
    /// State was left untouched; `artifact` is the phase's empty artifact.
    Degraded {
        artifact: Record,
        reason: DegradeReason,
    },
}

impl PhaseOutcome {
    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced(_))
    }

    pub fn artifact(&self) -> &Record {
        match self {
            Self::Produced(artifact) | Self::Degraded { artifact, .. } => artifact,
        }
    }
}

/// Runs any [`PhaseSpec`] against a project state.
///
/// Failures never escape: an exhausted retry budget or an unusable response
/// yields [`PhaseOutcome::Degraded`] and leaves the phase incomplete.
pub struct PhaseHandler<'a> {
    service: &'a GenerationService,
    config: GenerationConfig,
}

impl<'a> PhaseHandler<'a> {
    pub fn new(service: &'a GenerationService, config: GenerationConfig) -> Self {
        Self { service, config }
    }

    pub async fn run(
        &self,
        spec: &PhaseSpec,
        state: &mut ProjectState,
        seeds: &GenerationSeeds,
        count: u32,
    ) -> PhaseOutcome {
        let prompt = spec.build_prompt(state, seeds, count);

        let raw = match self.service.call(spec.caller, &prompt, &self.config).await {
            Ok(raw) => raw,
            Err(failure) => {
                error!(
                    caller = spec.caller,
                    attempts = failure.attempts,
                    error = %failure.last_error,
                    "Generation failed after retries"
                );
                return degraded(spec, DegradeReason::CallFailed(failure));
            }
        };

        let artifact = match normalize(&raw) {
            Ok(artifact) => artifact,
            Err(failure) => {
                error!(
                    caller = spec.caller,
                    error = %failure.error,
                    raw = %failure.raw_excerpt,
                    "Failed to parse response"
                );
                return degraded(spec, DegradeReason::Unparseable(failure));
            }
        };

        if artifact.is_empty() {
            warn!(caller = spec.caller, "Response parsed to an empty object");
            return degraded(spec, DegradeReason::Empty);
        }

        let missing = spec.missing_keys(&artifact);
        if !missing.is_empty() {
            warn!(caller = spec.caller, missing = ?missing, "Response is missing required keys");
            return degraded(spec, DegradeReason::MissingKeys(missing));
        }

        (spec.write)(state, &artifact);
        state.complete_phase(spec.phase);

        info!(
            caller = spec.caller,
            phase = %spec.phase,
            keys = artifact.len(),
            "Artifact stored"
        );
        PhaseOutcome::Produced(artifact)
    }
}

fn degraded(spec: &PhaseSpec, reason: DegradeReason) -> PhaseOutcome {
    PhaseOutcome::Degraded {
        artifact: spec.empty_artifact(),
        reason,
    }
}
