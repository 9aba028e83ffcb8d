//! The five lore phases as data.
//!
//! A [`PhaseSpec`] bundles everything that distinguishes one phase from
//! another: the context it reads, the prompt it composes, the artifact keys it
//! expects and how the artifact is written back into [`ProjectState`]. The
//! generic [`crate::PhaseHandler`] runs any of them.

use serde_json::Value;

use lorewright_state::{ProjectState, Record};
use lorewright_utils::types::Phase;

use crate::constraints::{ConstraintProfile, GameHint};
use crate::prompts::{
    PromptInputs, characters_prompt, conflicts_prompt, eras_prompt, factions_prompt,
    routes_prompt,
};
use crate::variety::GenerationSeeds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    List,
    Object,
}

/// One top-level key of a phase artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactField {
    pub key: &'static str,
    pub kind: FieldKind,
    /// Artifacts without this key are rejected
    pub required: bool,
}

const fn list(key: &'static str) -> ArtifactField {
    ArtifactField {
        key,
        kind: FieldKind::List,
        required: false,
    }
}

const fn object(key: &'static str) -> ArtifactField {
    ArtifactField {
        key,
        kind: FieldKind::Object,
        required: false,
    }
}

const fn required(field: ArtifactField) -> ArtifactField {
    ArtifactField {
        required: true,
        ..field
    }
}

/// Static description of one generative phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSpec {
    pub phase: Phase,
    /// Caller id recorded in the usage log
    pub caller: &'static str,
    pub shape: &'static [ArtifactField],
    pub constraints: ConstraintProfile,
    pub context: fn(&ProjectState) -> String,
    pub compose: fn(&PromptInputs<'_>) -> String,
    pub write: fn(&mut ProjectState, &Record),
}

impl PhaseSpec {
    /// The artifact a degraded run reports: every shape key, empty.
    #[must_use]
    pub fn empty_artifact(&self) -> Record {
        self.shape
            .iter()
            .map(|field| {
                let empty = match field.kind {
                    FieldKind::List => Value::Array(Vec::new()),
                    FieldKind::Object => Value::Object(Record::new()),
                };
                (field.key.to_string(), empty)
            })
            .collect()
    }

    /// Required keys absent from `artifact`.
    #[must_use]
    pub fn missing_keys(&self, artifact: &Record) -> Vec<&'static str> {
        self.shape
            .iter()
            .filter(|field| field.required && !artifact.contains_key(field.key))
            .map(|field| field.key)
            .collect()
    }

    #[must_use]
    pub fn build_prompt(&self, state: &ProjectState, seeds: &GenerationSeeds, count: u32) -> String {
        let constraints = self.constraints.render(seeds);
        let context = (self.context)(state);
        (self.compose)(&PromptInputs {
            project_name: state.project_name(),
            constraints: &constraints,
            context: &context,
            count,
            suggested_names: &seeds.suggested_names,
        })
    }
}

/// Object items of the list under `key`; anything else reads as empty.
fn records(artifact: &Record, key: &str) -> Vec<Record> {
    match artifact.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn record(artifact: &Record, key: &str) -> Record {
    artifact
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn no_context(_: &ProjectState) -> String {
    String::new()
}

fn character_phase_context(state: &ProjectState) -> String {
    [state.world_context(), state.faction_context()].join("\n\n")
}

fn conflict_phase_context(state: &ProjectState) -> String {
    [
        state.world_context(),
        state.faction_context(),
        state.character_context(),
    ]
    .join("\n\n")
}

fn write_eras(state: &mut ProjectState, artifact: &Record) {
    state.set_cosmology(record(artifact, "cosmology"));
    state.set_eras(records(artifact, "eras"));
}

fn write_factions(state: &mut ProjectState, artifact: &Record) {
    state.set_factions(records(artifact, "factions"));
    if artifact.contains_key("territories") {
        state.set_territories(records(artifact, "territories"));
    }
}

fn write_characters(state: &mut ProjectState, artifact: &Record) {
    state.set_characters(records(artifact, "characters"));
    state.set_relationships(records(artifact, "relationships"));
}

fn write_conflicts(state: &mut ProjectState, artifact: &Record) {
    state.set_conflicts(records(artifact, "conflicts"));
    state.set_dilemmas(records(artifact, "dilemmas"));
    state.set_moments_of_light(records(artifact, "moments_of_light"));
}

fn write_routes(state: &mut ProjectState, artifact: &Record) {
    for (key, route) in record(artifact, "routes") {
        if let Value::Object(route) = route {
            state.set_route(&key, route);
        }
    }
    state.set_decision_points(records(artifact, "decision_points"));
    let hidden = record(artifact, "hidden_route");
    if !hidden.is_empty() {
        state.add_hidden_route(hidden);
    }
}

/// The generative phases in pipeline order.
pub static PHASES: [PhaseSpec; 5] = [
    PhaseSpec {
        phase: Phase::Eras,
        caller: "era_architect",
        shape: &[object("cosmology"), list("eras")],
        constraints: ConstraintProfile {
            banned_sample: 20,
            names_per_list: 0,
            include_places: false,
            events: 3,
            game_hint: GameHint::Themes,
        },
        context: no_context,
        compose: eras_prompt,
        write: write_eras,
    },
    PhaseSpec {
        phase: Phase::Factions,
        caller: "faction_forge",
        shape: &[required(list("factions")), list("territories")],
        constraints: ConstraintProfile {
            banned_sample: 15,
            names_per_list: 5,
            include_places: true,
            events: 0,
            game_hint: GameHint::None,
        },
        context: ProjectState::world_context,
        compose: factions_prompt,
        write: write_factions,
    },
    PhaseSpec {
        phase: Phase::Characters,
        caller: "soul_weaver",
        shape: &[list("characters"), list("relationships")],
        constraints: ConstraintProfile {
            banned_sample: 10,
            names_per_list: 4,
            include_places: false,
            events: 0,
            game_hint: GameHint::EmotionalBeats,
        },
        context: character_phase_context,
        compose: characters_prompt,
        write: write_characters,
    },
    PhaseSpec {
        phase: Phase::Conflicts,
        caller: "conflict_designer",
        shape: &[list("conflicts"), list("dilemmas"), list("moments_of_light")],
        constraints: ConstraintProfile {
            banned_sample: 10,
            names_per_list: 0,
            include_places: false,
            events: 2,
            game_hint: GameHint::None,
        },
        context: conflict_phase_context,
        compose: conflicts_prompt,
        write: write_conflicts,
    },
    PhaseSpec {
        phase: Phase::Routes,
        caller: "pathweaver",
        shape: &[object("routes"), list("decision_points"), object("hidden_route")],
        constraints: ConstraintProfile {
            banned_sample: 8,
            names_per_list: 0,
            include_places: false,
            events: 0,
            game_hint: GameHint::NarrativeMechanics,
        },
        context: ProjectState::lore_digest,
        compose: routes_prompt,
        write: write_routes,
    },
];

/// Look up the spec for a generative phase.
#[must_use]
pub fn spec_for(phase: Phase) -> Option<&'static PhaseSpec> {
    PHASES.iter().find(|spec| spec.phase == phase)
}
