//! Per-phase rendering of variety seeds into a prompt block.

use crate::variety::{GenerationSeeds, first};

/// Which part of the reference game a phase draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameHint {
    None,
    Themes,
    EmotionalBeats,
    NarrativeMechanics,
}

/// How much of the seed bundle a phase shows the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintProfile {
    /// Leading banned words listed (not sampled, so prompts are stable per run)
    pub banned_sample: usize,
    /// Names shown per culture and gender; 0 omits the name section
    pub names_per_list: usize,
    pub include_places: bool,
    /// Event inspirations shown; 0 omits the section
    pub events: usize,
    pub game_hint: GameHint,
}

impl ConstraintProfile {
    pub fn render(&self, seeds: &GenerationSeeds) -> String {
        let mut lines = vec![
            "=== VARIETY CONSTRAINTS (FOLLOW STRICTLY) ===".to_string(),
            String::new(),
            format!("Emotional Tone: {}", seeds.emotion_seed),
            format!("Aesthetic: {}", seeds.aesthetic_seed),
            format!("Core Conflict: {}", seeds.conflict_seed),
            String::new(),
        ];

        if !seeds.name_cultures.is_empty() {
            lines.push(format!(
                "Cultural Inspiration: Draw names and concepts from {} traditions.",
                seeds.name_cultures.join(", ")
            ));
            lines.push(String::new());
        }

        if self.names_per_list > 0 && !seeds.name_pools.is_empty() {
            lines.push("Sample names to use (pick from these styles):".to_string());
            for (culture, pool) in &seeds.name_pools {
                let people: Vec<String> = pool
                    .male
                    .iter()
                    .take(self.names_per_list)
                    .chain(pool.female.iter().take(self.names_per_list))
                    .cloned()
                    .collect();
                if !people.is_empty() {
                    lines.push(format!("  {culture} (people): {}", people.join(", ")));
                }
                if self.include_places && !pool.places.is_empty() {
                    lines.push(format!(
                        "  {culture} (places): {}",
                        first(&pool.places, self.names_per_list)
                    ));
                }
            }
            lines.push(String::new());
        }

        if self.events > 0 && !seeds.event_inspirations.is_empty() {
            lines.push("Historical Parallels (use as inspiration, not copying):".to_string());
            for event in seeds.event_inspirations.iter().take(self.events) {
                let detail = if event.description.is_empty() {
                    &event.emotional_core
                } else {
                    &event.description
                };
                lines.push(format!("  - {}: {detail}", event.name));
            }
            lines.push(String::new());
        }

        if let Some(hint) = self.game_hint_line(seeds) {
            lines.push(hint);
            lines.push(String::new());
        }

        if self.banned_sample > 0 && !seeds.banned_words.is_empty() {
            lines.push(format!(
                "BANNED WORDS (never use): {}",
                first(&seeds.banned_words, self.banned_sample)
            ));
        }

        lines.push("=== END CONSTRAINTS ===".to_string());
        lines.join("\n")
    }

    fn game_hint_line(&self, seeds: &GenerationSeeds) -> Option<String> {
        let game = seeds.game_details.as_ref()?;
        let (label, items, n) = match self.game_hint {
            GameHint::None => return None,
            GameHint::Themes => ("Thematic reference", &game.themes, 3),
            GameHint::EmotionalBeats => ("Emotional reference", &game.emotional_beats, 2),
            GameHint::NarrativeMechanics => {
                ("Structural inspiration", &game.narrative_mechanics, 2)
            }
        };
        if items.is_empty() {
            return None;
        }
        let title = if game.full_name.is_empty() {
            seeds.game_reference.clone().unwrap_or_default()
        } else {
            game.full_name.clone()
        };
        Some(format!("{label} ({title}): {}", first(items, n)))
    }
}
