//! Response normalization: pull a JSON object out of model output.

mod normalizer;

pub use lorewright_utils::types::Record;
pub use normalizer::{ParseFailure, RAW_EXCERPT_CHARS, extract_json, normalize, parse};
