//! The root aggregate of a lore project.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::warn;

use lorewright_utils::types::{Phase, Record};

/// Current document layout version
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_TONE: &str = "dark_fantasy_introspective";

/// Routes that exist in every initialized state, in display order
pub const BASE_ROUTES: [&str; 3] = ["light", "shadow", "neutral"];

/// Variety constraints recorded for a run; informational only, never replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSnapshot {
    pub name_cultures: Vec<String>,
    pub emotion_seed: String,
    pub aesthetic_seed: String,
    pub conflict_seed: String,
    pub game_reference: String,
    /// Event template names
    pub event_inspirations: Vec<String>,
}

/// Every artifact generated for a project plus pipeline bookkeeping.
///
/// The state round-trips through a flat JSON document
/// ([`ProjectState::to_document`] / [`ProjectState::from_document`]).
/// Deserialization is lenient: missing fields take their defaults and the
/// three base routes are always restored.
///
/// `completed_phases` only grows. There is deliberately no way to remove a
/// phase once [`ProjectState::complete_phase`] has recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    schema_version: u32,
    project_name: String,
    tone: String,
    variety_seeds: SeedSnapshot,

    eras: Vec<Record>,
    cosmology: Record,

    factions: Vec<Record>,
    territories: Vec<Record>,

    characters: Vec<Record>,
    relationships: Vec<Record>,

    conflicts: Vec<Record>,
    dilemmas: Vec<Record>,
    moments_of_light: Vec<Record>,

    #[serde(deserialize_with = "deserialize_routes")]
    routes: BTreeMap<String, Record>,
    decision_points: Vec<Record>,
    hidden_routes: Vec<Record>,

    current_phase: Phase,
    #[serde(deserialize_with = "deserialize_completed_phases")]
    completed_phases: BTreeSet<Phase>,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            project_name: String::new(),
            tone: DEFAULT_TONE.to_string(),
            variety_seeds: SeedSnapshot::default(),
            eras: Vec::new(),
            cosmology: Record::new(),
            factions: Vec::new(),
            territories: Vec::new(),
            characters: Vec::new(),
            relationships: Vec::new(),
            conflicts: Vec::new(),
            dilemmas: Vec::new(),
            moments_of_light: Vec::new(),
            routes: base_routes(),
            decision_points: Vec::new(),
            hidden_routes: Vec::new(),
            current_phase: Phase::NotStarted,
            completed_phases: BTreeSet::new(),
        }
    }
}

fn empty_route() -> Record {
    let mut route = Record::new();
    route.insert("name".to_string(), Value::String(String::new()));
    route.insert("chapters".to_string(), Value::Array(Vec::new()));
    route.insert("ending".to_string(), Value::String(String::new()));
    route.insert("unlocked".to_string(), Value::Bool(false));
    route
}

fn base_routes() -> BTreeMap<String, Record> {
    BASE_ROUTES
        .iter()
        .map(|key| ((*key).to_string(), empty_route()))
        .collect()
}

fn deserialize_routes<'de, D>(deserializer: D) -> Result<BTreeMap<String, Record>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut routes = BTreeMap::<String, Record>::deserialize(deserializer)?;
    for key in BASE_ROUTES {
        routes.entry(key.to_string()).or_insert_with(empty_route);
    }
    Ok(routes)
}

/// Unknown phase names are dropped so a newer checkpoint still loads.
fn deserialize_completed_phases<'de, D>(deserializer: D) -> Result<BTreeSet<Phase>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    let mut phases = BTreeSet::new();
    for entry in entries {
        match entry.as_str().map(Phase::from_str) {
            Some(Ok(phase)) => {
                phases.insert(phase);
            }
            _ => warn!(entry = %entry, "Ignoring unknown completed phase"),
        }
    }
    Ok(phases)
}

impl ProjectState {
    /// Empty state for a named project.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    /// Interpret a persisted document.
    ///
    /// # Errors
    ///
    /// Fails when the document is not an object or a field has the wrong shape.
    /// Unrecognized entries in `completed_phases` are skipped with a warning.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(document)
    }

    /// Serialize to the flat document handed to a durable store.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors; none are expected for this type.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    // === Project info ===

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Set the project name unless one is already recorded.
    ///
    /// Returns `false` when an existing, different name was kept.
    pub fn set_project_name(&mut self, name: &str) -> bool {
        if self.project_name.is_empty() {
            self.project_name = name.to_string();
            return true;
        }
        self.project_name == name
    }

    pub fn tone(&self) -> &str {
        &self.tone
    }

    pub fn set_tone(&mut self, tone: impl Into<String>) {
        self.tone = tone.into();
    }

    pub fn variety_seeds(&self) -> &SeedSnapshot {
        &self.variety_seeds
    }

    pub fn set_variety_seeds(&mut self, seeds: SeedSnapshot) {
        self.variety_seeds = seeds;
    }

    // === Eras & cosmology ===

    pub fn cosmology(&self) -> &Record {
        &self.cosmology
    }

    pub fn set_cosmology(&mut self, cosmology: Record) {
        self.cosmology = cosmology;
    }

    pub fn eras(&self) -> &[Record] {
        &self.eras
    }

    pub fn set_eras(&mut self, eras: Vec<Record>) {
        self.eras = eras;
    }

    // === Factions ===

    pub fn factions(&self) -> &[Record] {
        &self.factions
    }

    pub fn set_factions(&mut self, factions: Vec<Record>) {
        self.factions = factions;
    }

    pub fn territories(&self) -> &[Record] {
        &self.territories
    }

    pub fn set_territories(&mut self, territories: Vec<Record>) {
        self.territories = territories;
    }

    /// Case-insensitive lookup by the record's `name` field.
    pub fn faction_by_name(&self, name: &str) -> Option<&Record> {
        find_by_name(&self.factions, name)
    }

    // === Characters ===

    pub fn characters(&self) -> &[Record] {
        &self.characters
    }

    pub fn set_characters(&mut self, characters: Vec<Record>) {
        self.characters = characters;
    }

    /// Case-insensitive lookup by the record's `name` field.
    pub fn character_by_name(&self, name: &str) -> Option<&Record> {
        find_by_name(&self.characters, name)
    }

    pub fn relationships(&self) -> &[Record] {
        &self.relationships
    }

    pub fn set_relationships(&mut self, relationships: Vec<Record>) {
        self.relationships = relationships;
    }

    // === Conflicts ===

    pub fn conflicts(&self) -> &[Record] {
        &self.conflicts
    }

    pub fn set_conflicts(&mut self, conflicts: Vec<Record>) {
        self.conflicts = conflicts;
    }

    pub fn dilemmas(&self) -> &[Record] {
        &self.dilemmas
    }

    pub fn set_dilemmas(&mut self, dilemmas: Vec<Record>) {
        self.dilemmas = dilemmas;
    }

    pub fn moments_of_light(&self) -> &[Record] {
        &self.moments_of_light
    }

    pub fn set_moments_of_light(&mut self, moments: Vec<Record>) {
        self.moments_of_light = moments;
    }

    // === Routes ===

    pub fn route(&self, key: &str) -> Option<&Record> {
        self.routes.get(key)
    }

    /// Routes in display order: light, shadow, neutral, then extensions by key.
    pub fn routes(&self) -> Vec<(&str, &Record)> {
        let mut ordered: Vec<(&str, &Record)> = BASE_ROUTES
            .iter()
            .filter_map(|key| self.routes.get_key_value(*key))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        ordered.extend(
            self.routes
                .iter()
                .filter(|(k, _)| !BASE_ROUTES.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v)),
        );
        ordered
    }

    /// Merge `data` into an existing route, or insert a new route.
    pub fn set_route(&mut self, key: &str, data: Record) {
        match self.routes.get_mut(key) {
            Some(existing) => existing.extend(data),
            None => {
                self.routes.insert(key.to_string(), data);
            }
        }
    }

    pub fn decision_points(&self) -> &[Record] {
        &self.decision_points
    }

    pub fn set_decision_points(&mut self, decisions: Vec<Record>) {
        self.decision_points = decisions;
    }

    pub fn hidden_routes(&self) -> &[Record] {
        &self.hidden_routes
    }

    pub fn add_hidden_route(&mut self, route: Record) {
        self.hidden_routes.push(route);
    }

    // === Progress ===

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn set_current_phase(&mut self, phase: Phase) {
        self.current_phase = phase;
    }

    /// Record `phase` as successfully produced.
    ///
    /// Only generative phases are recorded; returns whether the set changed.
    pub fn complete_phase(&mut self, phase: Phase) -> bool {
        phase.is_generative() && self.completed_phases.insert(phase)
    }

    pub fn is_phase_completed(&self, phase: Phase) -> bool {
        self.completed_phases.contains(&phase)
    }

    /// Completed phases in pipeline order.
    pub fn completed_phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.completed_phases.iter().copied()
    }

    /// First generative phase not yet completed, if any.
    pub fn next_incomplete_phase(&self) -> Option<Phase> {
        Phase::GENERATIVE
            .into_iter()
            .find(|phase| !self.is_phase_completed(*phase))
    }

    /// Number of records per collection, for status output.
    pub fn artifact_counts(&self) -> BTreeMap<&'static str, usize> {
        let named_routes = self
            .routes
            .values()
            .filter(|route| route.get("name").is_some_and(is_present))
            .count();
        BTreeMap::from([
            ("eras", self.eras.len()),
            ("factions", self.factions.len()),
            ("territories", self.territories.len()),
            ("characters", self.characters.len()),
            ("relationships", self.relationships.len()),
            ("conflicts", self.conflicts.len()),
            ("dilemmas", self.dilemmas.len()),
            ("moments_of_light", self.moments_of_light.len()),
            ("routes", named_routes),
            ("decision_points", self.decision_points.len()),
            ("hidden_routes", self.hidden_routes.len()),
        ])
    }
}

fn find_by_name<'a>(records: &'a [Record], name: &str) -> Option<&'a Record> {
    let wanted = name.to_lowercase();
    records.iter().find(|record| {
        record
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| n.to_lowercase() == wanted)
    })
}

/// Python-style truthiness for advisory fields: null, empty and `false` are absent.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_new_state_has_base_routes() {
        let state = ProjectState::new("Ashen Crown");
        for key in BASE_ROUTES {
            let route = state.route(key).unwrap();
            assert_eq!(route["name"], json!(""));
            assert_eq!(route["unlocked"], json!(false));
        }
        assert_eq!(state.current_phase(), Phase::NotStarted);
        assert_eq!(state.completed_phases().count(), 0);
        assert_eq!(state.tone(), DEFAULT_TONE);
    }

    #[test]
    fn test_unknown_completed_phase_is_skipped() {
        let state = ProjectState::from_document(json!({
            "project_name": "Ashen Crown",
            "completed_phases": ["eras", "epilogue", 7, "factions"]
        }))
        .unwrap();

        assert!(state.is_phase_completed(Phase::Eras));
        assert!(state.is_phase_completed(Phase::Factions));
        assert_eq!(state.completed_phases().count(), 2);
    }

    #[test]
    fn test_document_round_trip() {
        let mut state = ProjectState::new("Ashen Crown");
        state.set_eras(vec![record(json!({"name": "Age of Ash", "summary": "fire"}))]);
        state.set_route("hidden_vigil", record(json!({"name": "Vigil"})));
        state.complete_phase(Phase::Eras);
        state.set_current_phase(Phase::Factions);

        let document = state.to_document().unwrap();
        assert_eq!(document["completed_phases"], json!(["eras"]));
        assert_eq!(document["current_phase"], json!("factions"));

        let restored = ProjectState::from_document(document).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_lenient_load_restores_defaults() {
        let document = json!({
            "project_name": "Old Save",
            "routes": {"light": {"name": "Dawn"}},
            "completed_phases": ["eras", "factions"]
        });

        let state = ProjectState::from_document(document).unwrap();

        assert_eq!(state.project_name(), "Old Save");
        assert_eq!(state.schema_version(), SCHEMA_VERSION);
        assert_eq!(state.route("light").unwrap()["name"], json!("Dawn"));
        assert!(state.route("shadow").is_some());
        assert!(state.route("neutral").is_some());
        assert!(state.is_phase_completed(Phase::Factions));
        assert_eq!(state.next_incomplete_phase(), Some(Phase::Characters));
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(ProjectState::from_document(json!(["not", "an", "object"])).is_err());
        assert!(ProjectState::from_document(json!({"eras": "oops"})).is_err());
        assert!(ProjectState::from_document(json!({"completed_phases": "eras"})).is_err());
    }

    #[test]
    fn test_set_route_merges_existing() {
        let mut state = ProjectState::new("x");
        state.set_route(
            "light",
            record(json!({"name": "The Long Dawn", "philosophy": "mercy"})),
        );

        let light = state.route("light").unwrap();
        assert_eq!(light["name"], json!("The Long Dawn"));
        assert_eq!(light["philosophy"], json!("mercy"));
        // untouched base keys survive the merge
        assert_eq!(light["unlocked"], json!(false));
    }

    #[test]
    fn test_routes_display_order() {
        let mut state = ProjectState::new("x");
        state.set_route("zealot", Record::new());
        state.set_route("archive", Record::new());
        let keys: Vec<&str> = state.routes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["light", "shadow", "neutral", "archive", "zealot"]);
    }

    #[test]
    fn test_project_name_set_once() {
        let mut state = ProjectState::default();
        assert!(state.set_project_name("First"));
        assert!(state.set_project_name("First"));
        assert!(!state.set_project_name("Second"));
        assert_eq!(state.project_name(), "First");
    }

    #[test]
    fn test_complete_phase_ignores_markers() {
        let mut state = ProjectState::default();
        assert!(!state.complete_phase(Phase::NotStarted));
        assert!(!state.complete_phase(Phase::Complete));
        assert!(state.complete_phase(Phase::Routes));
        assert!(!state.complete_phase(Phase::Routes));
        assert_eq!(state.completed_phases().collect::<Vec<_>>(), vec![Phase::Routes]);
    }

    #[test]
    fn test_lookup_by_name_is_case_insensitive() {
        let mut state = ProjectState::default();
        state.set_factions(vec![record(json!({"name": "The Ember Synod"}))]);
        state.set_characters(vec![record(json!({"name": "Vael Morrow"}))]);

        assert!(state.faction_by_name("the ember synod").is_some());
        assert!(state.character_by_name("VAEL MORROW").is_some());
        assert!(state.faction_by_name("Nobody").is_none());
    }

    #[test]
    fn test_artifact_counts_only_named_routes() {
        let mut state = ProjectState::default();
        state.set_route("shadow", record(json!({"name": "Nightfall"})));
        state.add_hidden_route(record(json!({"name": "Ossuary"})));
        let counts = state.artifact_counts();
        assert_eq!(counts["routes"], 1);
        assert_eq!(counts["hidden_routes"], 1);
        assert_eq!(counts["eras"], 0);
    }

    fn arb_op() -> impl Strategy<Value = (u8, usize)> {
        (0u8..4, 0usize..7)
    }

    proptest! {
        #[test]
        fn prop_completed_set_is_monotonic(ops in prop::collection::vec(arb_op(), 0..40)) {
            let all = [
                Phase::NotStarted,
                Phase::Eras,
                Phase::Factions,
                Phase::Characters,
                Phase::Conflicts,
                Phase::Routes,
                Phase::Complete,
            ];
            let mut state = ProjectState::new("prop");
            let mut seen: BTreeSet<Phase> = BTreeSet::new();

            for (op, index) in ops {
                let phase = all[index];
                match op {
                    0 => { state.complete_phase(phase); }
                    1 => state.set_current_phase(phase),
                    2 => state.set_eras(Vec::new()),
                    _ => {
                        let document = state.to_document().unwrap();
                        state = ProjectState::from_document(document).unwrap();
                    }
                }
                let now: BTreeSet<Phase> = state.completed_phases().collect();
                prop_assert!(seen.is_subset(&now));
                seen = now;
            }
        }
    }
}
