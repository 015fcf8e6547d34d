//! YAML configuration file support.
//!
//! All stage knobs can be set from a single YAML file and loaded at
//! runtime. Every field has a default, so a partial file (or none at all)
//! configures a complete pipeline.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//!
//! select:
//!   min_chars: 15
//!
//! embedding:
//!   batch_size: 100
//!   dimension: 768
//!   inter_batch_delay_ms: 100
//!   per_text_delay_ms: 50
//!
//! cluster:
//!   seed: 42
//!   n_init: 10
//!   max_iter: 100
//!   min_k: 4
//!   max_k: 10
//!
//! report:
//!   quotes_per_theme: 5
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cluster::KMeansConfig;
use embedding::EmbedConfig;
use ingest::SelectConfig;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Configuration format version.
    #[serde(default = "default_config_version")]
    pub version: String,

    #[serde(default)]
    pub select: SelectYamlConfig,

    #[serde(default)]
    pub embedding: EmbeddingYamlConfig,

    #[serde(default)]
    pub cluster: ClusterYamlConfig,

    #[serde(default)]
    pub report: ReportYamlConfig,
}

fn default_config_version() -> String {
    "1.0".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            select: SelectYamlConfig::default(),
            embedding: EmbeddingYamlConfig::default(),
            cluster: ClusterYamlConfig::default(),
            report: ReportYamlConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;
        self.embedding.validate()?;
        self.cluster.validate()?;
        self.report.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectYamlConfig {
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

fn default_min_chars() -> usize {
    SelectConfig::default().min_chars
}

impl Default for SelectYamlConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
        }
    }
}

impl SelectYamlConfig {
    pub fn to_select_config(&self) -> SelectConfig {
        SelectConfig {
            min_chars: self.min_chars,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingYamlConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_ms: u64,

    #[serde(default = "default_per_text_delay")]
    pub per_text_delay_ms: u64,
}

fn default_batch_size() -> usize {
    EmbedConfig::default().batch_size
}

fn default_dimension() -> usize {
    EmbedConfig::default().dimension
}

fn default_inter_batch_delay() -> u64 {
    EmbedConfig::default().inter_batch_delay_ms
}

fn default_per_text_delay() -> u64 {
    EmbedConfig::default().per_text_delay_ms
}

impl Default for EmbeddingYamlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dimension: default_dimension(),
            inter_batch_delay_ms: default_inter_batch_delay(),
            per_text_delay_ms: default_per_text_delay(),
        }
    }
}

impl EmbeddingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.batch_size must be >= 1".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.dimension must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_embed_config(&self) -> EmbedConfig {
        EmbedConfig {
            batch_size: self.batch_size,
            dimension: self.dimension,
            inter_batch_delay_ms: self.inter_batch_delay_ms,
            per_text_delay_ms: self.per_text_delay_ms,
            ..EmbedConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterYamlConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_n_init")]
    pub n_init: usize,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Lower bound of the k scan.
    #[serde(default = "default_min_k")]
    pub min_k: usize,

    /// Upper bound of the k scan.
    #[serde(default = "default_max_k")]
    pub max_k: usize,
}

fn default_seed() -> u64 {
    KMeansConfig::default().seed
}

fn default_n_init() -> usize {
    KMeansConfig::default().n_init
}

fn default_max_iter() -> usize {
    KMeansConfig::default().max_iter
}

fn default_min_k() -> usize {
    4
}

fn default_max_k() -> usize {
    10
}

impl Default for ClusterYamlConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            n_init: default_n_init(),
            max_iter: default_max_iter(),
            min_k: default_min_k(),
            max_k: default_max_k(),
        }
    }
}

impl ClusterYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.min_k < 2 {
            return Err(ConfigLoadError::Validation(
                "cluster.min_k must be >= 2".to_string(),
            ));
        }
        if self.max_k < self.min_k {
            return Err(ConfigLoadError::Validation(
                "cluster.max_k must be >= cluster.min_k".to_string(),
            ));
        }
        if self.n_init == 0 {
            return Err(ConfigLoadError::Validation(
                "cluster.n_init must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_kmeans_config(&self) -> KMeansConfig {
        KMeansConfig {
            seed: self.seed,
            n_init: self.n_init,
            max_iter: self.max_iter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportYamlConfig {
    #[serde(default = "default_quotes_per_theme")]
    pub quotes_per_theme: usize,
}

fn default_quotes_per_theme() -> usize {
    5
}

impl Default for ReportYamlConfig {
    fn default() -> Self {
        Self {
            quotes_per_theme: default_quotes_per_theme(),
        }
    }
}

impl ReportYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.quotes_per_theme == 0 {
            return Err(ConfigLoadError::Validation(
                "report.quotes_per_theme must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
