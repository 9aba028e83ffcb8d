//! Shared types used across lorewright crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumString, VariantNames};

/// A semi-structured artifact record: string keys to arbitrary JSON values.
///
/// Shapes are advisory; nothing validates the fields beyond the top-level keys
/// a phase requires.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Position of a lore project in the generation pipeline.
///
/// The pipeline moves strictly in declaration order:
///
/// ```text
/// not_started → eras → factions → characters → conflicts → routes → complete
/// ```
///
/// Only the five generative phases ([`Phase::GENERATIVE`]) ever appear in a
/// project's completed set. `NotStarted` and `Complete` are bookkeeping markers
/// for the current position.
///
/// # Example
///
/// ```rust
/// use lorewright_utils::types::Phase;
/// use std::str::FromStr;
///
/// assert_eq!(Phase::Factions.as_str(), "factions");
/// assert_eq!(Phase::from_str("routes").unwrap(), Phase::Routes);
/// assert!(Phase::Eras < Phase::Routes);
/// ```
///
/// # Serialization
///
/// `Phase` serializes to its snake_case name (e.g., `"not_started"`, `"eras"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Phase {
    /// Nothing has been attempted yet.
    NotStarted,
    /// Cosmology and historical eras.
    Eras,
    /// Political factions.
    Factions,
    /// Characters and their relationships.
    Characters,
    /// Conflicts, dilemmas and moments of light.
    Conflicts,
    /// Branching routes, decision points and the hidden route.
    Routes,
    /// Every phase has been attempted; terminal.
    Complete,
}

impl Phase {
    /// The phases that produce artifacts, in pipeline order.
    pub const GENERATIVE: [Phase; 5] = [
        Phase::Eras,
        Phase::Factions,
        Phase::Characters,
        Phase::Conflicts,
        Phase::Routes,
    ];

    /// Returns the canonical snake_case name of the phase.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Eras => "eras",
            Self::Factions => "factions",
            Self::Characters => "characters",
            Self::Conflicts => "conflicts",
            Self::Routes => "routes",
            Self::Complete => "complete",
        }
    }

    /// Whether this phase runs a handler and can be marked complete.
    #[must_use]
    pub const fn is_generative(&self) -> bool {
        !matches!(self, Self::NotStarted | Self::Complete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many items each phase is asked to generate.
///
/// Defaults match the shipped configuration: 4 eras, 5 factions, 6 characters,
/// 4 conflicts and 5 chapters per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseCounts {
    pub eras: u32,
    pub factions: u32,
    pub characters: u32,
    pub conflicts: u32,
    pub chapters_per_route: u32,
}

impl Default for PhaseCounts {
    fn default() -> Self {
        Self {
            eras: 4,
            factions: 5,
            characters: 6,
            conflicts: 4,
            chapters_per_route: 5,
        }
    }
}

impl PhaseCounts {
    /// The count parameter handed to the handler for `phase`.
    ///
    /// Non-generative phases have no count and return 0.
    #[must_use]
    pub const fn for_phase(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Eras => self.eras,
            Phase::Factions => self.factions,
            Phase::Characters => self.characters,
            Phase::Conflicts => self.conflicts,
            Phase::Routes => self.chapters_per_route,
            Phase::NotStarted | Phase::Complete => 0,
        }
    }
}

/// Status returned to callers of the orchestrator.
///
/// Serializes to the uppercase strings `"PAUSED"`, `"COMPLETE"` and `"ERROR"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// Halted at a phase boundary on request; resumable.
    Paused,
    /// Every phase was attempted.
    Complete,
    /// An unexpected error escaped the pipeline.
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paused => write!(f, "PAUSED"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Source of a configuration value.
///
/// Precedence, highest first: CLI arguments, environment, config file,
/// programmatic builder, built-in defaults.
///
/// Serializes to lowercase strings: `"cli"`, `"env"`, `"config"`,
/// `"programmatic"`, `"default"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Env,
    Config,
    Programmatic,
    Default,
}

impl ConfigSource {
    /// Stable label used in `config` output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}
