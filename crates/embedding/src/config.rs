use std::time::Duration;

use gemini::{RetryPolicy, TaskType};
use serde::{Deserialize, Serialize};

/// Tuning for the batched embedding stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Texts per batch request.
    pub batch_size: usize,
    /// Width of the sentinel vector emitted when every fallback fails.
    pub dimension: usize,
    /// Pause between consecutive batch requests, in milliseconds.
    pub inter_batch_delay_ms: u64,
    /// Pause between per-text fallback requests, in milliseconds.
    pub per_text_delay_ms: u64,
    #[serde(skip)]
    pub retry: RetryPolicy,
    #[serde(skip)]
    pub task: TaskType,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            dimension: 768,
            inter_batch_delay_ms: 100,
            per_text_delay_ms: 50,
            retry: RetryPolicy::default(),
            task: TaskType::Clustering,
        }
    }
}

impl EmbedConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn per_text_delay(&self) -> Duration {
        Duration::from_millis(self.per_text_delay_ms)
    }
}
