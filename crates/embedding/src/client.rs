//! Batched embedding with graceful degradation.
//!
//! The client never fails a run over embeddings: a batch that keeps failing
//! after retries degrades to per-text requests, and a text that still cannot
//! be embedded gets a zero-vector sentinel so downstream indices stay
//! aligned with the input corpus.

use std::sync::Arc;

use gemini::{with_retry, EmbeddingService, ServiceError};

use crate::config::EmbedConfig;

pub struct EmbeddingClient {
    service: Arc<dyn EmbeddingService>,
    config: EmbedConfig,
}

/// True when a vector is the all-zero sentinel emitted for a failed text.
pub fn is_sentinel(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

impl EmbeddingClient {
    pub fn new(service: Arc<dyn EmbeddingService>, config: EmbedConfig) -> Self {
        Self { service, config }
    }

    /// Embed every text, preserving input order. Output length always equals
    /// input length.
    pub async fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (batch_index, batch) in texts.chunks(self.config.batch_size.max(1)).enumerate() {
            vectors.extend(self.embed_batch(batch_index, batch).await);
            // Rate-limit pause after every batch, the final one included.
            tokio::time::sleep(self.config.inter_batch_delay()).await;
        }
        let sentinels = vectors.iter().filter(|v| is_sentinel(v)).count();
        if sentinels > 0 {
            tracing::warn!(sentinels, total = texts.len(), "some texts could not be embedded");
        }
        vectors
    }

    async fn embed_batch(&self, batch_index: usize, batch: &[String]) -> Vec<Vec<f32>> {
        let attempt = with_retry(&self.config.retry, |_| {
            self.service.embed_batch(batch, self.config.task)
        })
        .await;

        match attempt {
            Ok(vectors) if vectors.len() == batch.len() => vectors,
            Ok(vectors) => {
                tracing::warn!(
                    batch_index,
                    expected = batch.len(),
                    received = vectors.len(),
                    "batch embedding came back misaligned, retrying per text"
                );
                self.embed_each(batch).await
            }
            Err(err) => {
                tracing::warn!(
                    batch_index,
                    error = %err,
                    "batch embedding failed after retries, retrying per text"
                );
                self.embed_each(batch).await
            }
        }
    }

    async fn embed_each(&self, batch: &[String]) -> Vec<Vec<f32>> {
        let mut vectors = Vec::with_capacity(batch.len());
        for (i, text) in batch.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.per_text_delay()).await;
            }
            match self.embed_single(text).await {
                Ok(vector) => vectors.push(vector),
                Err(err) => {
                    tracing::warn!(error = %err, "text could not be embedded, using sentinel");
                    vectors.push(vec![0.0; self.config.dimension]);
                }
            }
        }
        vectors
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        with_retry(&self.config.retry, |_| {
            self.service.embed_one(text, self.config.task)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use gemini::{RetryPolicy, TaskType};

    use super::*;

    fn quick_config() -> EmbedConfig {
        EmbedConfig {
            batch_size: 2,
            dimension: 4,
            inter_batch_delay_ms: 0,
            per_text_delay_ms: 0,
            retry: RetryPolicy::default()
                .with_base_delay(Duration::from_millis(1))
                .with_jitter(false),
            task: TaskType::Clustering,
        }
    }

    /// Fails the first `batch_failures` batch calls, then succeeds. Per-text
    /// calls fail for texts containing "poison".
    struct Flaky {
        batch_failures: u32,
        batch_calls: AtomicU32,
        single_calls: AtomicU32,
    }

    impl Flaky {
        fn new(batch_failures: u32) -> Self {
            Self {
                batch_failures,
                batch_calls: AtomicU32::new(0),
                single_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingService for Flaky {
        async fn embed_batch(
            &self,
            texts: &[String],
            _task: TaskType,
        ) -> Result<Vec<Vec<f32>>, ServiceError> {
            let call = self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.batch_failures {
                return Err(ServiceError::RateLimited);
            }
            Ok(texts.iter().map(|_| vec![1.0, 2.0, 3.0, 4.0]).collect())
        }

        async fn embed_one(&self, text: &str, _task: TaskType) -> Result<Vec<f32>, ServiceError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("poison") {
                return Err(ServiceError::Permanent {
                    status: 400,
                    message: "bad text".into(),
                });
            }
            Ok(vec![5.0, 6.0, 7.0, 8.0])
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {i}")).collect()
    }

    #[tokio::test]
    async fn transient_batch_failure_recovers_without_fallback() {
        let service = Arc::new(Flaky::new(1));
        let client = EmbeddingClient::new(service.clone(), quick_config());
        let vectors = client.embed(&texts(2)).await;
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| !is_sentinel(v)));
        // Retried inside the batch path, never dropped to per-text calls.
        assert_eq!(service.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausted_batch_falls_back_per_text() {
        // More failures than the retry ceiling for both batches.
        let service = Arc::new(Flaky::new(100));
        let client = EmbeddingClient::new(service.clone(), quick_config());
        let vectors = client.embed(&texts(3)).await;
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v == &vec![5.0, 6.0, 7.0, 8.0]));
        assert_eq!(service.single_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unembeddable_text_becomes_sentinel() {
        let service = Arc::new(Flaky::new(100));
        let client = EmbeddingClient::new(service, quick_config());
        let input = vec!["fine".to_string(), "poison pill".to_string()];
        let vectors = client.embed(&input).await;
        assert_eq!(vectors.len(), 2);
        assert!(!is_sentinel(&vectors[0]));
        assert!(is_sentinel(&vectors[1]));
        assert_eq!(vectors[1].len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_after_every_batch_including_the_last() {
        let service = Arc::new(Flaky::new(0));
        let config = EmbedConfig {
            inter_batch_delay_ms: 100,
            ..quick_config()
        };
        let client = EmbeddingClient::new(service, config);

        let start = tokio::time::Instant::now();
        client.embed(&texts(4)).await; // two batches of two
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn output_stays_aligned_across_batches() {
        let service = Arc::new(Flaky::new(0));
        let client = EmbeddingClient::new(service, quick_config());
        let vectors = client.embed(&texts(5)).await;
        assert_eq!(vectors.len(), 5);
    }

    #[tokio::test]
    async fn misaligned_batch_response_triggers_fallback() {
        struct Short;

        #[async_trait]
        impl EmbeddingService for Short {
            async fn embed_batch(
                &self,
                _texts: &[String],
                _task: TaskType,
            ) -> Result<Vec<Vec<f32>>, ServiceError> {
                Ok(vec![vec![1.0; 4]]) // always one vector, whatever was asked
            }

            async fn embed_one(
                &self,
                _text: &str,
                _task: TaskType,
            ) -> Result<Vec<f32>, ServiceError> {
                Ok(vec![9.0; 4])
            }
        }

        let client = EmbeddingClient::new(Arc::new(Short), quick_config());
        let vectors = client.embed(&texts(2)).await;
        assert_eq!(vectors, vec![vec![9.0; 4], vec![9.0; 4]]);
    }
}
