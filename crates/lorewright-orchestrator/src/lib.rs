//! Lore pipeline orchestration
//!
//! [`LoreOrchestrator`] drives the five generation phases in order over a
//! single project state, checkpointing to a [`lorewright_state::DurableStore`]
//! after every phase boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use lorewright_llm::GenerationConfig;
//! use lorewright_orchestrator::{GenerationRequest, LoreOrchestrator};
//! use lorewright_phases::VarietyInjector;
//! use lorewright_state::JsonFileStore;
//! use lorewright_utils::types::Phase;
//!
//! # async fn demo(service: lorewright_llm::GenerationService) {
//! let store = JsonFileStore::new("lore_projects");
//! let injector = VarietyInjector::from_data_dir("data");
//! let orchestrator =
//!     LoreOrchestrator::new(&service, &store, &injector, GenerationConfig::default());
//!
//! let outcome = orchestrator
//!     .start(GenerationRequest::new("Ashen Crown").stop_after(Some(Phase::Factions)))
//!     .await;
//! println!("{} at {}", outcome.status, outcome.phase);
//! # }
//! ```

mod pipeline;
mod request;

pub use pipeline::LoreOrchestrator;
pub use request::{GenerationOutcome, GenerationRequest};
