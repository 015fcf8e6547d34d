//! The output contract: one report, many themes, stable shape across both
//! analysis methods.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-theme tallies over the categorical covariates of its member
/// documents. BTreeMaps keep category order stable in the artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Segments {
    pub by_arrival_time: BTreeMap<String, usize>,
    pub by_mode: BTreeMap<String, usize>,
    pub by_frequency: BTreeMap<String, usize>,
    /// Share of member documents whose author skipped class; `None` when
    /// the theme has no members to tally.
    pub skip_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    pub id: usize,
    pub label: String,
    pub description: String,
    pub count: usize,
    /// Percentage of the analyzed corpus, rounded to one decimal.
    pub pct: f64,
    pub quotes: Vec<String>,
    pub segments: Segments,
    /// True when the label or quotes came from a local fallback instead of
    /// the generative model.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    pub generated_at: DateTime<Utc>,
    pub input_file: String,
    pub total_texts: usize,
    pub n_clusters: usize,
    /// `"kmeans_clustering"` or `"llm_thematic_analysis"`.
    pub method: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeReport {
    pub metadata: RunMetadata,
    pub themes: Vec<Theme>,
}
