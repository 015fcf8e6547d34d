//! Themescope service boundary.
//!
//! This crate owns everything that talks to the outside world: the explicit
//! client configuration, the error taxonomy with its retryable/permanent
//! split, a retry helper with exponential backoff, the
//! [`EmbeddingService`]/[`GenerativeService`] traits that the pipeline
//! stages program against, the reqwest-backed [`GeminiClient`], and a
//! deterministic [`StubService`] for offline and test runs.
//!
//! Nothing here decides pipeline policy. Batching, sentinels and fallback
//! labeling live in the stage crates; this layer only moves requests and
//! classifies failures.

pub mod config;
pub mod error;
pub mod retry;
pub mod service;

mod rest;
mod stub;

pub use crate::config::GeminiConfig;
pub use crate::error::{classify_status, ServiceError};
pub use crate::rest::GeminiClient;
pub use crate::retry::{with_retry, RetryPolicy};
pub use crate::service::{EmbeddingService, GenerativeService, ModelRole, TaskType};
pub use crate::stub::StubService;
