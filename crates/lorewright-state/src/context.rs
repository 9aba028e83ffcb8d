//! Plain-text context summaries injected into phase prompts.

use serde_json::Value;

use crate::project_state::{ProjectState, is_present};
use lorewright_utils::types::Record;

/// Render a field as prompt text: strings verbatim, string lists comma-joined,
/// anything else as compact JSON.
pub(crate) fn field_text(record: &Record, key: &str) -> Option<String> {
    let value = record.get(key).filter(|v| is_present(v))?;
    Some(value_text(value))
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub(crate) fn field_or(record: &Record, key: &str, fallback: &str) -> String {
    field_text(record, key).unwrap_or_else(|| fallback.to_string())
}

fn truncated(record: &Record, key: &str, max_chars: usize) -> String {
    field_or(record, key, "").chars().take(max_chars).collect()
}

impl ProjectState {
    /// Cosmology and eras, for phases that build on world history.
    #[must_use]
    pub fn world_context(&self) -> String {
        let mut lines = Vec::new();

        if !self.cosmology().is_empty() {
            lines.push("=== COSMOLOGY ===".to_string());
            if let Some(myth) = field_text(self.cosmology(), "creation_myth") {
                lines.push(format!("Creation: {myth}"));
            }
            if let Some(forces) = field_text(self.cosmology(), "divine_forces") {
                lines.push(format!("Divine Forces: {forces}"));
            }
            lines.push(String::new());
        }

        if !self.eras().is_empty() {
            lines.push("=== HISTORICAL ERAS ===".to_string());
            for era in self.eras() {
                lines.push(format!(
                    "- {}: {}",
                    field_or(era, "name", "Unknown"),
                    field_or(era, "summary", "")
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    #[must_use]
    pub fn faction_context(&self) -> String {
        let mut lines = vec!["=== FACTIONS ===".to_string()];
        for faction in self.factions() {
            lines.push(format!("- {}", field_or(faction, "name", "Unknown")));
            if let Some(ideology) = field_text(faction, "ideology") {
                lines.push(format!("  Ideology: {ideology}"));
            }
            if let Some(rivals) = field_text(faction, "rivals") {
                lines.push(format!("  Rivals: {rivals}"));
            }
        }
        lines.join("\n")
    }

    #[must_use]
    pub fn character_context(&self) -> String {
        let mut lines = vec!["=== CHARACTERS ===".to_string()];
        for character in self.characters() {
            lines.push(format!(
                "- {} ({})",
                field_or(character, "name", "Unknown"),
                field_or(character, "archetype", "Unknown")
            ));
            if let Some(motivation) = field_text(character, "motivation") {
                lines.push(format!("  Motivation: {motivation}"));
            }
            if let Some(faction) = field_text(character, "faction") {
                lines.push(format!("  Faction: {faction}"));
            }
        }
        lines.join("\n")
    }

    /// Condensed digest of everything generated so far, for the routes phase.
    #[must_use]
    pub fn lore_digest(&self) -> String {
        let mut lines = vec![
            "=== EXISTING LORE (use this in your routes) ===".to_string(),
            String::new(),
        ];

        let mut section = |title: &str, records: &[Record], render: &dyn Fn(&Record) -> String| {
            if records.is_empty() {
                return;
            }
            lines.push(format!("{title}:"));
            lines.extend(records.iter().map(|r| format!("  - {}", render(r))));
            if title != "DILEMMAS" {
                lines.push(String::new());
            }
        };

        section("ERAS", self.eras(), &|era| {
            format!(
                "{}: {}",
                field_or(era, "name", "Unknown"),
                truncated(era, "summary", 100)
            )
        });
        section("FACTIONS", self.factions(), &|faction| {
            format!(
                "{}: {}",
                field_or(faction, "name", "Unknown"),
                truncated(faction, "ideology", 80)
            )
        });
        section("CHARACTERS", self.characters(), &|character| {
            format!(
                "{} ({}): {}",
                field_or(character, "name", "Unknown"),
                field_or(character, "archetype", ""),
                truncated(character, "motivation", 60)
            )
        });
        section("CONFLICTS", self.conflicts(), &|conflict| {
            format!(
                "{}: {}",
                field_or(conflict, "name", "Unknown"),
                truncated(conflict, "root_cause", 80)
            )
        });
        section("DILEMMAS", self.dilemmas(), &|dilemma| {
            format!(
                "{}: {}",
                field_or(dilemma, "name", "Unknown"),
                truncated(dilemma, "situation", 80)
            )
        });

        lines.push(String::new());
        lines.push("=== END LORE ===".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn seeded_state() -> ProjectState {
        let mut state = ProjectState::new("Ashen Crown");
        state.set_cosmology(record(json!({
            "creation_myth": "The world was sung from a dying star",
            "divine_forces": ["The Hollow Choir", "The Ember Mother"]
        })));
        state.set_eras(vec![record(json!({
            "name": "Age of Cinders",
            "summary": "x".repeat(150)
        }))]);
        state.set_factions(vec![record(json!({
            "name": "The Ember Synod",
            "ideology": "Purity through flame",
            "rivals": ["Grey Wardens", "Salt Court"]
        }))]);
        state.set_characters(vec![record(json!({
            "name": "Vael Morrow",
            "archetype": "The Shadow",
            "motivation": "Atone for the burning",
            "faction": "The Ember Synod"
        }))]);
        state
    }

    #[test]
    fn test_world_context() {
        let context = seeded_state().world_context();
        assert!(context.starts_with("=== COSMOLOGY ===\nCreation: The world was sung"));
        assert!(context.contains("Divine Forces: The Hollow Choir, The Ember Mother"));
        assert!(context.contains("=== HISTORICAL ERAS ===\n- Age of Cinders: "));
    }

    #[test]
    fn test_world_context_empty_state() {
        assert_eq!(ProjectState::default().world_context(), "");
    }

    #[test]
    fn test_faction_context_lists_rivals() {
        let context = seeded_state().faction_context();
        assert_eq!(
            context,
            "=== FACTIONS ===\n- The Ember Synod\n  Ideology: Purity through flame\n  Rivals: Grey Wardens, Salt Court"
        );
    }

    #[test]
    fn test_character_context() {
        let context = seeded_state().character_context();
        assert!(context.contains("- Vael Morrow (The Shadow)"));
        assert!(context.contains("  Motivation: Atone for the burning"));
        assert!(context.contains("  Faction: The Ember Synod"));
    }

    #[test]
    fn test_lore_digest_truncates() {
        let digest = seeded_state().lore_digest();
        let era_line = digest
            .lines()
            .find(|l| l.starts_with("  - Age of Cinders: "))
            .unwrap();
        assert_eq!(
            era_line.len(),
            "  - Age of Cinders: ".len() + 100
        );
        assert!(digest.contains("CHARACTERS:\n  - Vael Morrow (The Shadow): Atone for the burning"));
        assert!(!digest.contains("CONFLICTS:"));
        assert!(digest.ends_with("=== END LORE ==="));
    }

    #[test]
    fn test_value_text_non_strings() {
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(value_text(&json!(["a", 2])), "[\"a\",2]");
    }
}
