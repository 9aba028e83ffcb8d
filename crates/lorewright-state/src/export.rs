//! Markdown "lore bible" rendering. Read-only over the state.

use serde_json::Value;

use crate::context::{field_or, field_text, value_text};
use crate::project_state::{ProjectState, is_present};
use lorewright_utils::types::Record;

/// Render `state` as a section-by-section Markdown document.
///
/// Empty sections are omitted, so partial projects export cleanly.
#[must_use]
pub fn export_markdown(state: &ProjectState) -> String {
    let seeds = state.variety_seeds();
    let title = if state.project_name().is_empty() {
        "Untitled"
    } else {
        state.project_name()
    };
    let emotion = if seeds.emotion_seed.is_empty() {
        "unknown"
    } else {
        &seeds.emotion_seed
    };

    let mut lines = vec![
        format!("# {title} - Game Lore Bible"),
        String::new(),
        format!(
            "*Generated with variety seeds: {}*",
            seeds.name_cultures.join(", ")
        ),
        format!("*Emotional core: {emotion}*"),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    cosmology_section(&mut lines, state.cosmology());
    eras_section(&mut lines, state.eras());
    factions_section(&mut lines, state.factions());
    characters_section(&mut lines, state.characters());
    conflicts_section(&mut lines, state.conflicts());
    routes_section(&mut lines, state);

    lines.join("\n")
}

fn push_labeled(lines: &mut Vec<String>, record: &Record, key: &str, label: &str) {
    if let Some(text) = field_text(record, key) {
        lines.push(format!("**{label}**: {text}"));
    }
}

fn heading(lines: &mut Vec<String>, title: &str) {
    lines.push(format!("## {title}"));
    lines.push(String::new());
}

fn cosmology_section(lines: &mut Vec<String>, cosmology: &Record) {
    if cosmology.is_empty() {
        return;
    }
    heading(lines, "Cosmology");
    push_labeled(lines, cosmology, "creation_myth", "Creation Myth");
    push_labeled(lines, cosmology, "divine_forces", "Divine Forces");
    push_labeled(lines, cosmology, "forbidden_knowledge", "Forbidden Knowledge");
    lines.push(String::new());
}

fn eras_section(lines: &mut Vec<String>, eras: &[Record]) {
    if eras.is_empty() {
        return;
    }
    heading(lines, "Historical Eras");
    for era in eras {
        let marker = if era.get("is_cataclysm").is_some_and(is_present) {
            " ⚠️"
        } else {
            ""
        };
        lines.push(format!("### {}{marker}", field_or(era, "name", "Unknown")));
        lines.push(format!("*{}*", field_or(era, "duration", "Unknown duration")));
        lines.push(String::new());
        lines.push(field_or(era, "summary", ""));
        if let Some(event) = field_text(era, "defining_event") {
            lines.push(format!("- **Defining Event**: {event}"));
        }
        if let Some(legacy) = field_text(era, "legacy") {
            lines.push(format!("- **Legacy**: {legacy}"));
        }
        lines.push(String::new());
    }
}

fn factions_section(lines: &mut Vec<String>, factions: &[Record]) {
    if factions.is_empty() {
        return;
    }
    heading(lines, "Factions");
    for faction in factions {
        lines.push(format!("### {}", field_or(faction, "name", "Unknown")));
        lines.push(format!("*{}*", field_or(faction, "type", "Unknown type")));
        lines.push(String::new());
        lines.push(format!(
            "**Ideology**: {}",
            field_or(faction, "ideology", "Unknown")
        ));
        push_labeled(lines, faction, "hidden_truth", "Hidden Truth");
        push_labeled(lines, faction, "dark_secret", "Dark Secret");
        push_labeled(lines, faction, "rivals", "Rivals");
        lines.push(String::new());
    }
}

fn characters_section(lines: &mut Vec<String>, characters: &[Record]) {
    if characters.is_empty() {
        return;
    }
    heading(lines, "Characters");
    for character in characters {
        lines.push(format!("### {}", field_or(character, "name", "Unknown")));
        if let Some(title) = field_text(character, "title") {
            lines.push(format!("*{title}*"));
        }
        lines.push(String::new());
        for (key, label) in [
            ("archetype", "Archetype"),
            ("faction", "Faction"),
            ("motivation", "Motivation"),
        ] {
            lines.push(format!("**{label}**: {}", field_or(character, key, "Unknown")));
        }
        push_labeled(lines, character, "inner_demon", "Inner Demon");
        if let Some(Value::Object(fates)) = character.get("fate_by_route")
            && !fates.is_empty()
        {
            let fate = |route: &str| field_or(fates, route, "?");
            lines.push(format!(
                "**Fates**: Light: {} | Shadow: {} | Neutral: {}",
                fate("light"),
                fate("shadow"),
                fate("neutral")
            ));
        }
        lines.push(String::new());
    }
}

fn conflicts_section(lines: &mut Vec<String>, conflicts: &[Record]) {
    if conflicts.is_empty() {
        return;
    }
    heading(lines, "Conflicts");
    for conflict in conflicts {
        lines.push(format!("### {}", field_or(conflict, "name", "Unknown")));
        lines.push(format!("*{}*", field_or(conflict, "type", "Unknown type")));
        lines.push(String::new());
        push_labeled(lines, conflict, "root_cause", "Root Cause");
        push_labeled(lines, conflict, "tragedy", "Tragedy");
        lines.push(String::new());
    }
}

fn routes_section(lines: &mut Vec<String>, state: &ProjectState) {
    heading(lines, "Story Routes");
    for (_, route) in state.routes() {
        let Some(name) = field_text(route, "name") else {
            continue;
        };
        lines.push(format!("### {name}"));
        if let Some(philosophy) = field_text(route, "philosophy") {
            lines.push(format!("*{philosophy}*"));
        }
        lines.push(String::new());
        push_labeled(lines, route, "sacrifice", "Sacrifice");
        match route.get("ending") {
            Some(Value::Object(ending)) if !ending.is_empty() => lines.push(format!(
                "**Ending**: {} - {}",
                field_or(ending, "name", "Unknown"),
                field_or(ending, "description", "")
            )),
            Some(ending) if is_present(ending) => {
                lines.push(format!("**Ending**: {}", value_text(ending)));
            }
            _ => {}
        }
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SeedSnapshot;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_state_header() {
        let markdown = export_markdown(&ProjectState::default());
        assert!(markdown.starts_with(
            "# Untitled - Game Lore Bible\n\n*Generated with variety seeds: *\n*Emotional core: unknown*\n\n---\n"
        ));
        assert!(!markdown.contains("## Cosmology"));
        assert!(!markdown.contains("## Historical Eras"));
        // base routes are unnamed, so the section has no entries
        assert!(!markdown.contains("### "));
    }

    #[test]
    fn test_full_export() {
        let mut state = ProjectState::new("Ashen Crown");
        state.set_variety_seeds(SeedSnapshot {
            name_cultures: vec!["slavic".to_string(), "norse".to_string()],
            emotion_seed: "quiet grief".to_string(),
            ..SeedSnapshot::default()
        });
        state.set_cosmology(record(json!({"creation_myth": "Sung from ash"})));
        state.set_eras(vec![record(json!({
            "name": "The Sundering",
            "is_cataclysm": true,
            "summary": "The sky broke.",
            "legacy": "Scars"
        }))]);
        state.set_factions(vec![record(json!({
            "name": "Salt Court",
            "ideology": "Preserve",
            "rivals": ["Ember Synod", "Grey Wardens"]
        }))]);
        state.set_characters(vec![record(json!({
            "name": "Vael",
            "title": "The Unburnt",
            "fate_by_route": {"light": "redeemed", "shadow": "consumed"}
        }))]);
        state.set_conflicts(vec![record(json!({"name": "Ash War", "tragedy": "Both right"}))]);
        state.set_route(
            "shadow",
            record(json!({
                "name": "Nightfall",
                "philosophy": "Power demands loss",
                "ending": {"name": "Ashen Throne", "description": "You rule alone"}
            })),
        );
        state.set_route("light", record(json!({"name": "Dawn", "ending": "A quiet morning"})));

        let markdown = export_markdown(&state);

        assert!(markdown.contains("*Generated with variety seeds: slavic, norse*"));
        assert!(markdown.contains("*Emotional core: quiet grief*"));
        assert!(markdown.contains("## Cosmology\n\n**Creation Myth**: Sung from ash\n"));
        assert!(markdown.contains(
            "### The Sundering ⚠️\n*Unknown duration*\n\nThe sky broke.\n- **Legacy**: Scars\n"
        ));
        assert!(markdown.contains("*Unknown type*\n\n**Ideology**: Preserve\n**Rivals**: Ember Synod, Grey Wardens"));
        assert!(markdown.contains("### Vael\n*The Unburnt*\n\n**Archetype**: Unknown"));
        assert!(markdown.contains("**Fates**: Light: redeemed | Shadow: consumed | Neutral: ?"));
        assert!(markdown.contains("**Tragedy**: Both right"));
        assert!(markdown.contains("**Ending**: Ashen Throne - You rule alone"));
        assert!(markdown.contains("**Ending**: A quiet morning"));

        let dawn = markdown.find("### Dawn").unwrap();
        let nightfall = markdown.find("### Nightfall").unwrap();
        assert!(dawn < nightfall, "light route renders before shadow");
    }
}
