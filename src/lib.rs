//! lorewright - resumable lore generation for branching narrative games
//!
//! lorewright builds a game world in five ordered phases (eras, factions,
//! characters, conflicts, routes). Each phase asks a generative model for one
//! JSON artifact, stores it in a single project state, and checkpoints that
//! state so an interrupted or paused run picks up where it stopped.
//!
//! lorewright can be used in two ways:
//! - **CLI**: run `lorewright generate <project>` and inspect the result with
//!   `status` or `export`
//! - **Library**: build a [`GenerationService`] and drive a
//!   [`LoreOrchestrator`] directly
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export GOOGLE_API_KEY=...
//!
//! # Stop after the factions phase
//! lorewright generate "Ashen Crown" --stop-after factions
//!
//! # Continue from the saved checkpoint
//! lorewright resume "Ashen Crown"
//!
//! # Write the lore bible
//! lorewright export "Ashen Crown" --output ashen_crown.md
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use lorewright::{Config, GenerationRequest, JsonFileStore, LoreOrchestrator, VarietyInjector};
//! use lorewright_llm::GenerationConfig;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::builder().state_dir("lore_projects").build()?;
//! let service = lorewright_llm::from_config(&config)?;
//! let store = JsonFileStore::new("lore_projects");
//! let injector = VarietyInjector::from_data_dir(&config.paths.data_dir);
//!
//! let orchestrator = LoreOrchestrator::new(
//!     &service,
//!     &store,
//!     &injector,
//!     GenerationConfig::from_settings(&config.generation),
//! );
//! let outcome = orchestrator.start(GenerationRequest::new("Ashen Crown")).await;
//! println!("{}", outcome.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Stable Public API
//!
//! - [`Config`] and [`ConfigBuilder`] - configuration management
//! - [`LoreOrchestrator`], [`GenerationRequest`], [`GenerationOutcome`] - the pipeline
//! - [`ProjectState`] and [`DurableStore`] - persisted lore
//! - [`Phase`], [`PhaseCounts`], [`RunStatus`] - shared types
//! - [`LoreError`] and [`ExitCode`] - errors and CLI exit codes

pub use lorewright_config::{CliArgs, Config, ConfigBuilder};
pub use lorewright_llm::{GenerationService, UsageStats};
pub use lorewright_orchestrator::{GenerationOutcome, GenerationRequest, LoreOrchestrator};
pub use lorewright_phases::{GenerationSeeds, VarietyInjector};
pub use lorewright_state::{
    DurableStore, JsonFileStore, MemoryStore, ProjectState, export_markdown,
};
pub use lorewright_utils::error::{LoreError, StoreError};
pub use lorewright_utils::exit_codes::ExitCode;
pub use lorewright_utils::types::{Phase, PhaseCounts, RunStatus};

pub mod cli;
