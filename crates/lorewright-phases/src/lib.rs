//! Lore generation phases
//!
//! Every phase follows the same contract: read a context summary from
//! [`lorewright_state::ProjectState`], compose a prompt from that context, the
//! run's [`GenerationSeeds`] and a count, call the generation service, then
//! normalize and store the artifact. Phases differ only in data, so they are
//! described by [`PhaseSpec`] values in [`PHASES`] and executed by one
//! [`PhaseHandler`].

mod constraints;
mod handler;
mod prompts;
mod registry;
mod variety;

pub use constraints::{ConstraintProfile, GameHint};
pub use handler::{DegradeReason, PhaseHandler, PhaseOutcome};
pub use prompts::{ARCHETYPES, OFFERED_ARCHETYPES, PromptInputs};
pub use registry::{ArtifactField, FieldKind, PHASES, PhaseSpec, spec_for};
pub use variety::{
    AESTHETIC_POOL, CONFLICT_POOL, EMOTION_POOL, EventTemplate, GameInspiration, Gender,
    GenerationSeeds, NamePool, VarietyInjector,
};
