//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs`.
//! Implementations live in `commands/*`.

mod common;
mod config;
mod export;
mod generate;
mod seeds;
mod status;

pub use config::execute_config_command;
pub use export::execute_export_command;
pub use generate::{execute_generate_command, execute_resume_command};
pub use seeds::execute_seeds_command;
pub use status::execute_status_command;
