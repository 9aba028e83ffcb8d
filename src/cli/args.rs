//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use lorewright_utils::logging::LogFormat;
use lorewright_utils::types::{Phase, PhaseCounts};

/// lorewright - phase-by-phase lore generation for branching narrative games
#[derive(Parser)]
#[command(name = "lorewright")]
#[command(about = "Generate game lore in resumable phases using a generative model")]
#[command(long_about = r#"
lorewright builds a game world in five ordered phases. Each phase asks the model
for one JSON artifact and checkpoints the project so a paused or interrupted run
can continue where it stopped.

EXAMPLES:
  # Generate everything for a new project
  lorewright generate "Ashen Crown"

  # Stop after the factions phase, review, then continue
  lorewright generate "Ashen Crown" --stop-after factions
  lorewright resume "Ashen Crown"

  # Inspect and export
  lorewright status "Ashen Crown" --json
  lorewright export "Ashen Crown" --output ashen_crown.md

  # Preview the variety seeds a run would use
  lorewright seeds --seed 42

CONFIGURATION:
  Precedence: CLI flags > LOREWRIGHT_* environment > config file > defaults
  The config file is discovered by searching upward from CWD for .lorewright/config.toml
  Use --config to specify an explicit config file path

PHASES:
  eras → factions → characters → conflicts → routes
  Completed phases are never re-run; a phase that fails is retried on the next run
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use for generation calls
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory holding project checkpoints
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Directory holding name pools, event templates and banned words
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Attempts per generation call before a phase degrades
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--log-format` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Per-phase item counts; unset values come from configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct CountArgs {
    /// Number of historical eras
    #[arg(long)]
    pub eras: Option<u32>,

    /// Number of factions
    #[arg(long)]
    pub factions: Option<u32>,

    /// Number of characters
    #[arg(long)]
    pub characters: Option<u32>,

    /// Number of conflicts
    #[arg(long)]
    pub conflicts: Option<u32>,

    /// Chapters per story route
    #[arg(long)]
    pub chapters_per_route: Option<u32>,
}

impl CountArgs {
    /// Overlay the given values on `base`.
    #[must_use]
    pub fn apply(&self, base: PhaseCounts) -> PhaseCounts {
        PhaseCounts {
            eras: self.eras.unwrap_or(base.eras),
            factions: self.factions.unwrap_or(base.factions),
            characters: self.characters.unwrap_or(base.characters),
            conflicts: self.conflicts.unwrap_or(base.conflicts),
            chapters_per_route: self.chapters_per_route.unwrap_or(base.chapters_per_route),
        }
    }
}

/// Accepts the five generative phase names.
pub fn parse_stop_phase(value: &str) -> Result<Phase, String> {
    let phase = Phase::from_str(value).map_err(|_| format!("unknown phase '{value}'"))?;
    if phase.is_generative() {
        Ok(phase)
    } else {
        Err(format!(
            "'{value}' is not a generative phase (expected eras, factions, characters, conflicts or routes)"
        ))
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the lore pipeline for a project
    ///
    /// Continues from the project's saved checkpoint when one exists unless
    /// --fresh is given. When every phase has been attempted, the Markdown lore
    /// bible is written next to the checkpoint.
    ///
    /// EXAMPLES:
    ///   lorewright generate "Ashen Crown"
    ///   lorewright generate "Ashen Crown" --characters 8 --stop-after characters
    ///   lorewright generate "Ashen Crown" --fresh --json
    Generate {
        /// Project name
        project: String,

        #[command(flatten)]
        counts: CountArgs,

        /// Pause after this phase (routes runs to completion)
        #[arg(long, value_parser = parse_stop_phase)]
        stop_after: Option<Phase>,

        /// Ignore any saved checkpoint and start from nothing
        #[arg(long)]
        fresh: bool,

        /// Print the run outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Continue a project from its saved checkpoint
    ///
    /// Counts come from configuration. A missing checkpoint starts a fresh run.
    Resume {
        /// Project name
        project: String,

        /// Pause after this phase (routes runs to completion)
        #[arg(long, value_parser = parse_stop_phase)]
        stop_after: Option<Phase>,

        /// Print the run outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the saved project as a Markdown lore bible
    Export {
        /// Project name
        project: String,

        /// Output path; defaults to `<project>_lore_bible.md` in the state directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the current phase, completed phases and artifact counts
    Status {
        /// Project name
        project: String,

        /// Output status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where each value came from
    Config,

    /// Preview the variety seeds a run would draw
    Seeds {
        /// RNG seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Build the clap command (for shell completions and argument tests)
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
