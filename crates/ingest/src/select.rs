//! Substantive-text selection over a loaded response set.

use serde::{Deserialize, Serialize};

use crate::types::{ResponseRecord, TextDocument, TextSource};

/// Configuration for the text selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectConfig {
    /// A text must be strictly longer than this many characters to count as
    /// substantive.
    pub min_chars: usize,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self { min_chars: 15 }
    }
}

/// Reduce responses to substantive text documents, preserving input order.
///
/// Per response: prefer the suggestion field when it clears the threshold,
/// otherwise fall back to the experience field; drop the response silently
/// when neither does. Each response contributes at most one document.
pub fn select_documents(records: &[ResponseRecord], cfg: &SelectConfig) -> Vec<TextDocument> {
    let mut documents = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let suggestion_len = record.suggestion.chars().count();
        let (text, source) = if suggestion_len > cfg.min_chars {
            (record.suggestion.as_str(), TextSource::Suggestion)
        } else {
            (record.skip_experience.as_str(), TextSource::Experience)
        };

        if text.chars().count() <= cfg.min_chars {
            continue;
        }

        let id = if record.id.is_empty() {
            format!("row-{idx}")
        } else {
            record.id.clone()
        };
        documents.push(TextDocument {
            id,
            text: text.to_string(),
            source,
            covariates: record.covariates(),
        });
    }
    tracing::info!(
        total = records.len(),
        substantive = documents.len(),
        "selected substantive text responses"
    );
    documents
}
