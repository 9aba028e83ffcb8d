//! Request and outcome types for a pipeline run.

use serde::Serialize;
use serde_json::Value;

use lorewright_llm::UsageStats;
use lorewright_utils::types::{Phase, PhaseCounts, RunStatus};

/// Parameters for one [`crate::LoreOrchestrator::start`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub project_name: String,
    pub counts: PhaseCounts,
    /// Pause after this phase; `routes` runs to completion
    pub stop_after: Option<Phase>,
    /// A previously returned or persisted state document to resume from
    pub existing_state: Option<Value>,
}

impl GenerationRequest {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_counts(mut self, counts: PhaseCounts) -> Self {
        self.counts = counts;
        self
    }

    #[must_use]
    pub fn stop_after(mut self, phase: Option<Phase>) -> Self {
        self.stop_after = phase;
        self
    }

    #[must_use]
    pub fn with_existing_state(mut self, document: Value) -> Self {
        self.existing_state = Some(document);
        self
    }
}

/// What a run hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub status: RunStatus,
    /// The phase the run stopped at (`complete` when finished)
    pub phase: Phase,
    /// Snapshot of the project state document
    pub state: Value,
    /// Phases attempted in this run that produced nothing
    pub degraded: Vec<Phase>,
    pub usage: UsageStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationOutcome {
    pub fn is_error(&self) -> bool {
        self.status == RunStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("Ashen Crown")
            .stop_after(Some(Phase::Factions))
            .with_existing_state(json!({"project_name": "Ashen Crown"}));
        assert_eq!(request.project_name, "Ashen Crown");
        assert_eq!(request.counts, PhaseCounts::default());
        assert_eq!(request.stop_after, Some(Phase::Factions));
        assert!(request.existing_state.is_some());
    }

    #[test]
    fn test_outcome_serializes_status_uppercase() {
        let outcome = GenerationOutcome {
            status: RunStatus::Paused,
            phase: Phase::Factions,
            state: json!({}),
            degraded: vec![Phase::Eras],
            usage: UsageStats::default(),
            error: None,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], json!("PAUSED"));
        assert_eq!(value["phase"], json!("factions"));
        assert_eq!(value["degraded"], json!(["eras"]));
        assert!(value.get("error").is_none());
    }
}
