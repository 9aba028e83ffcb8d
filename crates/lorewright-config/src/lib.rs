//! Layered configuration for lorewright.
//!
//! Precedence, highest first: CLI flags, `LOREWRIGHT_*` environment variables,
//! `.lorewright/config.toml`, built-in defaults. [`ConfigBuilder`] bypasses
//! discovery entirely for embedding.

mod config;

pub use config::*;
pub use lorewright_utils::types::{ConfigSource, PhaseCounts};
