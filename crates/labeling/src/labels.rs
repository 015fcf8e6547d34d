//! Single-call batch labeling for all clusters at once.
//!
//! Labeling every cluster in one prompt lets the model see the whole
//! partition and keep labels distinct. Shortfalls, duplicates and outright
//! call failures all degrade to keyword labels instead of failing the run.

use std::collections::HashSet;
use std::sync::Arc;

use gemini::{with_retry, GenerativeService, ModelRole, RetryPolicy};

use crate::fallback::fallback_label;

/// Characters kept per sampled comment in the prompt.
const SAMPLE_CLIP: usize = 100;
/// Sampled comments per cluster in the prompt.
const SAMPLES_PER_CLUSTER: usize = 3;
/// Ceiling on the length of a returned label.
const LABEL_CLIP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabel {
    pub text: String,
    /// True when this label came from the keyword fallback rather than the
    /// generative model.
    pub degraded: bool,
}

pub struct LabelGenerator {
    service: Arc<dyn GenerativeService>,
    retry: RetryPolicy,
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Strip leading enumeration like `1.`, `2)`, `3:` and surrounding quotes.
fn clean_label_line(line: &str) -> String {
    let mut rest = line.trim();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(stripped) = after
            .strip_prefix('.')
            .or_else(|| after.strip_prefix(')'))
            .or_else(|| after.strip_prefix(':'))
        {
            rest = stripped.trim_start();
        } else if after.starts_with(char::is_whitespace) {
            rest = after.trim_start();
        }
    }
    clip(rest.trim_matches(|c| c == '"' || c == '\''), LABEL_CLIP)
        .trim()
        .to_string()
}

fn build_prompt(clusters: &[Vec<String>]) -> String {
    let sections: Vec<String> = clusters
        .iter()
        .enumerate()
        .map(|(i, texts)| {
            let samples: Vec<String> = texts
                .iter()
                .take(SAMPLES_PER_CLUSTER)
                .map(|t| format!("  - {}", clip(t, SAMPLE_CLIP)))
                .collect();
            format!(
                "CLUSTER {} ({} comments):\n{}",
                i + 1,
                texts.len(),
                samples.join("\n")
            )
        })
        .collect();

    format!(
        "Below are {n} different clusters of student comments about university parking.\n\
         Each cluster contains related comments. Generate a SHORT, UNIQUE label (2-4 words) for EACH cluster.\n\
         \n\
         IMPORTANT: Each label must be DIFFERENT from the others. Focus on what makes each cluster distinct.\n\
         \n\
         {sections}\n\
         \n\
         Reply with EXACTLY {n} labels, one per line, in order. No numbering, no quotes, just the labels.\n\
         Example format:\n\
         Need More Spots\n\
         Cost Too High\n\
         Distance to Class\n\
         Bus Route Issues\n",
        n = clusters.len(),
        sections = sections.join("\n\n")
    )
}

impl LabelGenerator {
    pub fn new(service: Arc<dyn GenerativeService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// One label per cluster, unique across the run.
    pub async fn label_all(&self, clusters: &[Vec<String>]) -> Vec<ClusterLabel> {
        if clusters.is_empty() {
            return Vec::new();
        }

        let prompt = build_prompt(clusters);
        let response = with_retry(&self.retry, |_| {
            self.service.generate(ModelRole::Label, &prompt)
        })
        .await;

        match response {
            Ok(text) => self.merge(clusters, &text),
            Err(err) => {
                tracing::warn!(error = %err, "label generation failed, using keyword labels");
                self.all_fallback(clusters)
            }
        }
    }

    fn merge(&self, clusters: &[Vec<String>], response: &str) -> Vec<ClusterLabel> {
        let parsed: Vec<String> = response
            .lines()
            .map(clean_label_line)
            .filter(|l| !l.is_empty())
            .collect();

        if parsed.len() < clusters.len() {
            tracing::warn!(
                received = parsed.len(),
                expected = clusters.len(),
                "label response came up short, padding with keyword labels"
            );
        }

        let mut used: HashSet<String> = HashSet::new();
        let mut labels = Vec::with_capacity(clusters.len());
        for (i, texts) in clusters.iter().enumerate() {
            match parsed.get(i) {
                Some(label) if !used.contains(label) => {
                    used.insert(label.clone());
                    labels.push(ClusterLabel {
                        text: label.clone(),
                        degraded: false,
                    });
                }
                // Duplicate or missing, either way the keyword path decides.
                _ => {
                    let label = fallback_label(texts, &used);
                    used.insert(label.clone());
                    labels.push(ClusterLabel {
                        text: label,
                        degraded: true,
                    });
                }
            }
        }
        labels
    }

    fn all_fallback(&self, clusters: &[Vec<String>]) -> Vec<ClusterLabel> {
        let mut used = HashSet::new();
        clusters
            .iter()
            .map(|texts| {
                let label = fallback_label(texts, &used);
                used.insert(label.clone());
                ClusterLabel {
                    text: label,
                    degraded: true,
                }
            })
            .collect()
    }
}
