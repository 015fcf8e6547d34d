//! Batched text embedding over the Gemini service boundary.
//!
//! Degradation ladder per batch: retry the batch call, then retry each text
//! individually, then emit a zero-vector sentinel. The stage never fails a
//! run and its output is always index-aligned with the input.

pub mod client;
pub mod config;

pub use crate::client::{is_sentinel, EmbeddingClient};
pub use crate::config::EmbedConfig;
