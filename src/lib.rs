//! themescope: thematic clustering and labeling for free-text survey
//! responses.
//!
//! The pipeline turns a cleaned survey CSV into a `themes.json` artifact:
//!
//! ```text
//! CSV rows ── select ──> documents ── embed ──> vectors
//!     ── choose k / k-means ──> clusters ── label + quotes ──> themes
//! ```
//!
//! Two interchangeable [`ThemeBuilder`]s produce the theme list:
//!
//! * [`ClusteringThemeBuilder`] — embeddings, silhouette-selected k-means,
//!   batch labeling, and centroid-plus-rerank quote selection. Labels and
//!   quotes degrade to local fallbacks when the model misbehaves.
//! * [`GenerativeThemeBuilder`] — the whole corpus goes to a large-context
//!   model in one prompt for researcher-style analysis, followed by a
//!   cheaper tagging pass that recovers per-theme membership for segment
//!   breakdowns.
//!
//! Both feed the same assembly step, so the artifact shape is identical
//! whichever method produced it.

pub mod config;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use cluster::{choose_k, kmeans, ClusterError, KMeansConfig};
use embedding::{EmbedConfig, EmbeddingClient};
use gemini::{EmbeddingService, GenerativeService, RetryPolicy, ServiceError};
use ingest::{IngestError, TextDocument};
use labeling::{LabelGenerator, QuoteSelector, ThematicAnalyzer};
use themes::{assemble_themes, RunMetadata, ThemeError, ThemeInput, ThemeReport};

pub use crate::config::{ConfigLoadError, PipelineConfig};
pub use gemini::{GeminiClient, GeminiConfig, StubService};
pub use ingest::{load_responses, select_documents};
pub use themes::write_report;

/// Runs on fewer substantive responses than this are refused outright,
/// before any network traffic.
pub const MIN_CORPUS: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("need at least {required} substantive responses, found {found}")]
    InsufficientInput { found: usize, required: usize },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),
}

/// A strategy that turns the document corpus into labeled theme groups.
#[async_trait]
pub trait ThemeBuilder: Send + Sync {
    async fn build(&self, documents: &[TextDocument]) -> Result<Vec<ThemeInput>, PipelineError>;

    /// Method tag recorded in the artifact metadata.
    fn method(&self) -> &'static str;

    /// Model name recorded in the artifact metadata.
    fn model(&self) -> String;
}

/// Embedding + k-means path.
pub struct ClusteringThemeBuilder {
    embedder: EmbeddingClient,
    labeler: LabelGenerator,
    quote_selector: QuoteSelector,
    kmeans_config: KMeansConfig,
    min_k: usize,
    max_k: usize,
    /// `Some(k)` skips the silhouette scan and clusters at exactly `k`.
    fixed_k: Option<usize>,
    quotes_per_theme: usize,
    model_name: String,
}

impl ClusteringThemeBuilder {
    pub fn new(
        embedding_service: Arc<dyn EmbeddingService>,
        generative_service: Arc<dyn GenerativeService>,
        config: &PipelineConfig,
        fixed_k: Option<usize>,
        model_name: String,
    ) -> Self {
        let retry = RetryPolicy::default();
        Self {
            embedder: EmbeddingClient::new(embedding_service, config.embedding.to_embed_config()),
            labeler: LabelGenerator::new(generative_service.clone(), retry),
            quote_selector: QuoteSelector::new(generative_service, retry),
            kmeans_config: config.cluster.to_kmeans_config(),
            min_k: config.cluster.min_k,
            max_k: config.cluster.max_k,
            fixed_k,
            quotes_per_theme: config.report.quotes_per_theme,
            model_name,
        }
    }

    /// Override the embedding stage config, mostly for tests.
    pub fn with_embed_config(mut self, embed: EmbedConfig, service: Arc<dyn EmbeddingService>) -> Self {
        self.embedder = EmbeddingClient::new(service, embed);
        self
    }

    /// Override the retry policy on the generative stages.
    pub fn with_retry(mut self, retry: RetryPolicy, service: Arc<dyn GenerativeService>) -> Self {
        self.labeler = LabelGenerator::new(service.clone(), retry);
        self.quote_selector = QuoteSelector::new(service, retry);
        self
    }
}

#[async_trait]
impl ThemeBuilder for ClusteringThemeBuilder {
    async fn build(&self, documents: &[TextDocument]) -> Result<Vec<ThemeInput>, PipelineError> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();

        tracing::info!(documents = texts.len(), "embedding corpus");
        let embeddings = self.embedder.embed(&texts).await;

        let k = match self.fixed_k {
            Some(k) => k,
            None => choose_k(&embeddings, self.min_k, self.max_k, &self.kmeans_config)?,
        };
        tracing::info!(k, "clustering");
        let clustering = kmeans(&embeddings, k, &self.kmeans_config)?;

        // Group member indices per cluster, dropping clusters that ended
        // up empty so every theme has at least one document behind it.
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (doc_idx, &cluster_idx) in clustering.assignments.iter().enumerate() {
            groups[cluster_idx].push(doc_idx);
        }
        let populated: Vec<(usize, Vec<usize>)> = groups
            .into_iter()
            .enumerate()
            .filter(|(_, members)| !members.is_empty())
            .collect();

        let cluster_texts: Vec<Vec<String>> = populated
            .iter()
            .map(|(_, members)| members.iter().map(|&i| texts[i].clone()).collect())
            .collect();

        let labels = self.labeler.label_all(&cluster_texts).await;

        let mut inputs = Vec::with_capacity(populated.len());
        for (slot, ((cluster_idx, members), label)) in
            populated.iter().zip(labels.iter()).enumerate()
        {
            let member_texts = &cluster_texts[slot];
            let member_embeddings: Vec<Vec<f32>> =
                members.iter().map(|&i| embeddings[i].clone()).collect();

            let selection = self
                .quote_selector
                .select_quotes(
                    member_texts,
                    &member_embeddings,
                    &clustering.centroids[*cluster_idx],
                    self.quotes_per_theme,
                    &label.text,
                )
                .await;

            inputs.push(ThemeInput {
                label: label.text.clone(),
                description: String::new(),
                count: members.len(),
                quotes: selection.quotes,
                members: members.clone(),
                degraded: label.degraded || selection.degraded,
            });
        }
        Ok(inputs)
    }

    fn method(&self) -> &'static str {
        "kmeans_clustering"
    }

    fn model(&self) -> String {
        self.model_name.clone()
    }
}

/// Whole-corpus generative analysis path.
pub struct GenerativeThemeBuilder {
    analyzer: ThematicAnalyzer,
    quotes_per_theme: usize,
    model_name: String,
}

impl GenerativeThemeBuilder {
    pub fn new(
        generative_service: Arc<dyn GenerativeService>,
        config: &PipelineConfig,
        model_name: String,
    ) -> Self {
        Self {
            analyzer: ThematicAnalyzer::new(generative_service, RetryPolicy::default()),
            quotes_per_theme: config.report.quotes_per_theme,
            model_name,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy, service: Arc<dyn GenerativeService>) -> Self {
        self.analyzer = ThematicAnalyzer::new(service, retry);
        self
    }
}

#[async_trait]
impl ThemeBuilder for GenerativeThemeBuilder {
    async fn build(&self, documents: &[TextDocument]) -> Result<Vec<ThemeInput>, PipelineError> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();

        let analysis = self.analyzer.analyze(&texts).await?;
        let labels: Vec<String> = analysis.themes.iter().map(|t| t.label.clone()).collect();

        tracing::info!(themes = labels.len(), "tagging corpus for segment breakdowns");
        let tags = self.analyzer.tag(&texts, &labels).await;

        let inputs = analysis
            .themes
            .into_iter()
            .map(|theme| {
                let members: Vec<usize> = tags
                    .iter()
                    .enumerate()
                    .filter(|(_, tag)| **tag == theme.label)
                    .map(|(i, _)| i)
                    .collect();
                // The analysis counts overlapping mentions; the tags are
                // primary-theme only, so prefer the analysis count when the
                // model provided one.
                let count = if theme.count > 0 { theme.count } else { members.len() };
                ThemeInput {
                    label: theme.label,
                    description: theme.description,
                    count,
                    quotes: theme.quotes.into_iter().take(self.quotes_per_theme).collect(),
                    members,
                    degraded: false,
                }
            })
            .collect();
        Ok(inputs)
    }

    fn method(&self) -> &'static str {
        "llm_thematic_analysis"
    }

    fn model(&self) -> String {
        self.model_name.clone()
    }
}

/// Run a builder over the corpus and assemble the final report.
///
/// Refuses corpora below [`MIN_CORPUS`] before the builder (and therefore
/// any network call) runs.
pub async fn run_pipeline(
    documents: &[TextDocument],
    builder: &dyn ThemeBuilder,
    input_file: &str,
) -> Result<ThemeReport, PipelineError> {
    if documents.len() < MIN_CORPUS {
        return Err(PipelineError::InsufficientInput {
            found: documents.len(),
            required: MIN_CORPUS,
        });
    }

    let inputs = builder.build(documents).await?;
    let n_clusters = inputs.len();
    let themes = assemble_themes(inputs, documents, documents.len());

    let labels: HashSet<&str> = themes.iter().map(|t| t.label.as_str()).collect();
    if labels.len() < themes.len() {
        tracing::warn!("duplicate theme labels survived assembly");
    }

    Ok(ThemeReport {
        metadata: RunMetadata {
            generated_at: Utc::now(),
            input_file: input_file.to_string(),
            total_texts: documents.len(),
            n_clusters,
            method: builder.method().to_string(),
            model: builder.model(),
        },
        themes,
    })
}
