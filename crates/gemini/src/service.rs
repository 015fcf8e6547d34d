use async_trait::async_trait;

use crate::error::ServiceError;

/// Embedding task hint forwarded to the provider.
///
/// Clustering runs use [`TaskType::Clustering`]; the index/query pair exists
/// for callers that embed for retrieval instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskType {
    #[default]
    Clustering,
    Document,
    Query,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Clustering => "CLUSTERING",
            TaskType::Document => "RETRIEVAL_DOCUMENT",
            TaskType::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Which generative model a prompt should be routed to.
///
/// The REST client maps roles to the model ids in its config; test doubles
/// are free to ignore the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Cluster label generation.
    Label,
    /// Quote re-ranking.
    Rerank,
    /// Whole-corpus thematic analysis.
    Analysis,
    /// Per-batch theme tagging.
    Tagging,
}

/// Text-to-vector boundary. One vector per input, same order.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_batch(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ServiceError>;

    async fn embed_one(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ServiceError>;
}

/// Prompt-to-text boundary. Responses are free text parsed by the caller.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(&self, role: ModelRole, prompt: &str) -> Result<String, ServiceError>;

    /// Same as [`generate`](Self::generate) but with a structured-output
    /// (JSON) hint attached to the request.
    async fn generate_json(&self, role: ModelRole, prompt: &str) -> Result<String, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_wire_names() {
        assert_eq!(TaskType::Clustering.as_str(), "CLUSTERING");
        assert_eq!(TaskType::Document.as_str(), "RETRIEVAL_DOCUMENT");
        assert_eq!(TaskType::Query.as_str(), "RETRIEVAL_QUERY");
    }
}
