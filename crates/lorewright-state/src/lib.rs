//! Project state for lorewright
//!
//! [`ProjectState`] is the aggregate every phase reads context from and writes
//! artifacts into. It serializes to a flat JSON document that a
//! [`DurableStore`] persists at each phase boundary. [`export_markdown`] renders
//! a read-only Markdown view of any state, complete or partial.

mod context;
mod export;
mod project_state;
mod store;

pub use export::export_markdown;
pub use lorewright_utils::types::Record;
pub use project_state::{BASE_ROUTES, DEFAULT_TONE, ProjectState, SCHEMA_VERSION, SeedSnapshot};
pub use store::{DurableStore, JsonFileStore, MemoryStore, sanitize_project_name, state_file_name};
