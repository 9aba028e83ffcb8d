//! Randomized variety constraints.
//!
//! The injector holds fixed tone pools plus optional data loaded from a data
//! directory. Each run draws one [`GenerationSeeds`] bundle; phases render the
//! parts they need into their prompts.
//!
//! Data directory layout (every file optional):
//!
//! ```text
//! data/
//! ├── name_pools/<culture>_names.json   {"male": [..], "female": [..], "places": [..]}
//! ├── event_templates.json              [{"name", "description", "emotional_core"}, ..]
//! ├── banned_lore_words.txt             one word or phrase per line, '#' comments
//! └── game_inspirations.json            {"<key>": {"full_name", "themes", ..}, ..}
//! ```

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use lorewright_state::SeedSnapshot;

pub const EMOTION_POOL: [&str; 16] = [
    "lingering regret",
    "quiet fury",
    "bitter hope",
    "hollow victory",
    "desperate longing",
    "cold resignation",
    "fierce devotion",
    "buried shame",
    "reluctant acceptance",
    "smoldering resentment",
    "fragile trust",
    "weary determination",
    "consuming guilt",
    "unexpected tenderness",
    "silent grief",
    "defiant joy",
];

pub const AESTHETIC_POOL: [&str; 16] = [
    "ash and bronze",
    "bone and silk",
    "rust and amber",
    "frost and obsidian",
    "tarnished gold",
    "weathered stone",
    "dried blood",
    "faded tapestry",
    "cracked porcelain",
    "iron and incense",
    "salt and shadow",
    "moss and ruin",
    "ember and soot",
    "pearl and venom",
    "copper and rain",
    "ivory and char",
];

pub const CONFLICT_POOL: [&str; 16] = [
    "inheritance dispute",
    "forbidden knowledge",
    "broken oath",
    "stolen birthright",
    "unpayable debt",
    "mercy misinterpreted",
    "necessary cruelty",
    "love across enemy lines",
    "duty versus desire",
    "truth that destroys",
    "salvation through sin",
    "peace through surrender",
    "justice delayed",
    "revenge incomplete",
    "loyalty unrewarded",
    "sacrifice unwitnessed",
];

const MAX_CULTURES: usize = 2;
const MAX_EVENTS: usize = 3;
const PROMPT_BANNED_SAMPLE: usize = 15;
const SUGGESTED_NAMES: usize = 8;

/// Names for one culture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamePool {
    pub male: Vec<String>,
    pub female: Vec<String>,
    pub places: Vec<String>,
}

/// A historical event used as loose inspiration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTemplate {
    pub name: String,
    pub description: String,
    pub emotional_core: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Thematic notes about a reference game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInspiration {
    pub full_name: String,
    pub themes: Vec<String>,
    pub narrative_mechanics: Vec<String>,
    pub emotional_beats: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// One run's worth of variety constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSeeds {
    pub name_cultures: Vec<String>,
    pub name_pools: BTreeMap<String, NamePool>,
    pub event_inspirations: Vec<EventTemplate>,
    pub banned_words: Vec<String>,
    pub emotion_seed: String,
    pub aesthetic_seed: String,
    pub conflict_seed: String,
    pub game_reference: Option<String>,
    pub game_details: Option<GameInspiration>,
    /// Names drawn from the selected cultures for character prompts
    pub suggested_names: Vec<String>,
}

impl GenerationSeeds {
    /// The reduced form recorded in project state.
    #[must_use]
    pub fn snapshot(&self) -> SeedSnapshot {
        SeedSnapshot {
            name_cultures: self.name_cultures.clone(),
            emotion_seed: self.emotion_seed.clone(),
            aesthetic_seed: self.aesthetic_seed.clone(),
            conflict_seed: self.conflict_seed.clone(),
            game_reference: self.game_reference.clone().unwrap_or_default(),
            event_inspirations: self
                .event_inspirations
                .iter()
                .map(|e| e.name.clone())
                .collect(),
        }
    }

    /// Full constraint block with a random sample of banned words.
    pub fn format_for_prompt<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut lines = vec![
            "=== VARIETY CONSTRAINTS ===".to_string(),
            String::new(),
            format!("Emotional Tone: {}", self.emotion_seed),
            format!("Aesthetic: {}", self.aesthetic_seed),
            format!("Core Conflict: {}", self.conflict_seed),
            String::new(),
            format!(
                "Cultural Inspiration: Draw names and concepts from {} traditions.",
                self.name_cultures.join(", ")
            ),
            String::new(),
        ];

        if !self.event_inspirations.is_empty() {
            lines.push("Historical Parallels (for inspiration, not copying):".to_string());
            for event in &self.event_inspirations {
                lines.push(format!("  - {}: {}", event.name, event.description));
            }
            lines.push(String::new());
        }

        if let Some(reference) = &self.game_reference {
            let game = self.game_details.clone().unwrap_or_default();
            let title = if game.full_name.is_empty() {
                reference.as_str()
            } else {
                game.full_name.as_str()
            };
            lines.push(format!("Thematic Reference: {title}"));
            if !game.themes.is_empty() {
                lines.push(format!("  Themes to consider: {}", first(&game.themes, 3)));
            }
            lines.push(String::new());
        }

        let sample: Vec<&str> = self
            .banned_words
            .choose_multiple(rng, PROMPT_BANNED_SAMPLE)
            .map(String::as_str)
            .collect();
        lines.push("BANNED WORDS/PHRASES (do NOT use these):".to_string());
        lines.push(format!("  {}", sample.join(", ")));
        lines.push(String::new());
        lines.push("=== END VARIETY CONSTRAINTS ===".to_string());

        lines.join("\n")
    }
}

/// Comma-join at most `n` leading items.
pub(crate) fn first(items: &[String], n: usize) -> String {
    items
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of randomized generation seeds.
#[derive(Debug, Clone, Default)]
pub struct VarietyInjector {
    data_dir: Option<PathBuf>,
    name_pools: BTreeMap<String, NamePool>,
    event_templates: Vec<EventTemplate>,
    banned_words: Vec<String>,
    game_inspirations: BTreeMap<String, GameInspiration>,
}

impl VarietyInjector {
    /// Load every optional data file under `data_dir`.
    ///
    /// Missing or unreadable files are skipped with a warning; the built-in
    /// tone pools are always available.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let injector = Self {
            data_dir: Some(data_dir.to_path_buf()),
            name_pools: load_name_pools(&data_dir.join("name_pools")),
            event_templates: load_json(&data_dir.join("event_templates.json")).unwrap_or_default(),
            banned_words: load_banned_words(&data_dir.join("banned_lore_words.txt")),
            game_inspirations: load_json(&data_dir.join("game_inspirations.json"))
                .unwrap_or_default(),
        };
        debug!(
            data_dir = %data_dir.display(),
            cultures = injector.name_pools.len(),
            events = injector.event_templates.len(),
            banned_words = injector.banned_words.len(),
            games = injector.game_inspirations.len(),
            "Loaded variety data"
        );
        injector
    }

    #[must_use]
    pub fn with_name_pool(mut self, culture: impl Into<String>, pool: NamePool) -> Self {
        self.name_pools.insert(culture.into(), pool);
        self
    }

    #[must_use]
    pub fn with_event_templates(mut self, events: Vec<EventTemplate>) -> Self {
        self.event_templates = events;
        self
    }

    #[must_use]
    pub fn with_banned_words(mut self, words: Vec<String>) -> Self {
        self.banned_words = words;
        self
    }

    #[must_use]
    pub fn with_game(mut self, key: impl Into<String>, game: GameInspiration) -> Self {
        self.game_inspirations.insert(key.into(), game);
        self
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn cultures(&self) -> impl Iterator<Item = &str> {
        self.name_pools.keys().map(String::as_str)
    }

    pub fn banned_words(&self) -> &[String] {
        &self.banned_words
    }

    /// Draw a fresh bundle of seeds for one run.
    pub fn get_generation_seeds<R: Rng + ?Sized>(&self, rng: &mut R) -> GenerationSeeds {
        let cultures: Vec<&String> = self.name_pools.keys().collect();
        let name_cultures: Vec<String> = cultures
            .choose_multiple(rng, MAX_CULTURES)
            .map(|c| (*c).clone())
            .collect();
        let name_pools = name_cultures
            .iter()
            .filter_map(|c| self.name_pools.get(c).map(|p| (c.clone(), p.clone())))
            .collect();

        let event_inspirations = self
            .event_templates
            .choose_multiple(rng, MAX_EVENTS)
            .cloned()
            .collect();

        let games: Vec<&String> = self.game_inspirations.keys().collect();
        let game_reference = games.choose(rng).map(|g| (*g).clone());
        let game_details = game_reference
            .as_ref()
            .and_then(|g| self.game_inspirations.get(g).cloned());

        let mut seeds = GenerationSeeds {
            name_cultures,
            name_pools,
            event_inspirations,
            banned_words: self.banned_words.clone(),
            emotion_seed: pick(&EMOTION_POOL, rng),
            aesthetic_seed: pick(&AESTHETIC_POOL, rng),
            conflict_seed: pick(&CONFLICT_POOL, rng),
            game_reference,
            game_details,
            suggested_names: Vec::new(),
        };
        seeds.suggested_names = self.sample_names(&seeds, rng, SUGGESTED_NAMES, None);
        seeds
    }

    /// Up to `count` distinct names from the cultures selected in `seeds`.
    ///
    /// Without a gender, or when a pool has no list for it, both lists are used.
    pub fn sample_names<R: Rng + ?Sized>(
        &self,
        seeds: &GenerationSeeds,
        rng: &mut R,
        count: usize,
        gender: Option<Gender>,
    ) -> Vec<String> {
        let mut names: Vec<&String> = Vec::new();
        for culture in &seeds.name_cultures {
            let Some(pool) = self.name_pools.get(culture) else {
                continue;
            };
            match gender {
                Some(Gender::Male) if !pool.male.is_empty() => names.extend(&pool.male),
                Some(Gender::Female) if !pool.female.is_empty() => names.extend(&pool.female),
                _ => {
                    names.extend(&pool.male);
                    names.extend(&pool.female);
                }
            }
        }
        names
            .choose_multiple(rng, count)
            .map(|n| (*n).clone())
            .collect()
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).map(|s| (*s).to_string()).unwrap_or_default()
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    if !path.is_file() {
        return None;
    }
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not load variety data");
            None
        }
    }
}

fn load_name_pools(dir: &Path) -> BTreeMap<String, NamePool> {
    let Ok(entries) = fs::read_dir(dir) else {
        return BTreeMap::new();
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let culture = stem.replace("_names", "");
            load_json::<NamePool>(&path).map(|pool| (culture, pool))
        })
        .collect()
}

fn load_banned_words(path: &Path) -> Vec<String> {
    if !path.is_file() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not load banned words");
            Vec::new()
        }
    }
}
