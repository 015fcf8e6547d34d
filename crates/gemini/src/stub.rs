use async_trait::async_trait;
use fxhash::hash64;

use crate::error::ServiceError;
use crate::service::{EmbeddingService, GenerativeService, ModelRole, TaskType};

/// Deterministic offline stand-in for the real service.
///
/// Embeddings are sinusoid values derived from a hash of the text, so equal
/// inputs always produce equal vectors and the whole pipeline becomes
/// reproducible without network access. The generative side fails with a
/// permanent error on purpose: offline runs exercise the keyword labeler and
/// the distance-ranked quote fallback.
#[derive(Debug, Clone)]
pub struct StubService {
    pub dimension: usize,
}

impl Default for StubService {
    fn default() -> Self {
        Self { dimension: 768 }
    }
}

impl StubService {
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn stub_vector(&self, text: &str) -> Vec<f32> {
        let h = hash64(text.as_bytes());
        (0..self.dimension)
            .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001).sin())
            .collect()
    }
}

#[async_trait]
impl EmbeddingService for StubService {
    async fn embed_batch(
        &self,
        texts: &[String],
        _task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|t| self.stub_vector(t)).collect())
    }

    async fn embed_one(&self, text: &str, _task: TaskType) -> Result<Vec<f32>, ServiceError> {
        Ok(self.stub_vector(text))
    }
}

#[async_trait]
impl GenerativeService for StubService {
    async fn generate(&self, _role: ModelRole, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Permanent {
            status: 501,
            message: "stub service has no generative model".into(),
        })
    }

    async fn generate_json(&self, _role: ModelRole, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Permanent {
            status: 501,
            message: "stub service has no generative model".into(),
        })
    }
}
