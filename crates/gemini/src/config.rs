use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::retry::RetryPolicy;

/// Explicit client configuration for the Gemini REST endpoints.
///
/// Nothing in the algorithmic code reads the environment; callers build this
/// once (typically via [`GeminiConfig::from_env`] in the binary) and pass it
/// into the client constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiConfig {
    /// API key appended as the `key` query parameter.
    pub api_key: String,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Model used for `batchEmbedContents` / `embedContent`.
    pub embed_model: String,
    /// Cheap generative model for cluster labels and quote re-ranking.
    pub label_model: String,
    /// Large-context model for the single-call thematic analysis path.
    pub analysis_model: String,
    /// Fast model for the per-batch tagging pass.
    pub tagging_model: String,
    /// Overall per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry policy applied by the call sites wrapping this client.
    pub retry: RetryPolicy,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            embed_model: "gemini-embedding-001".into(),
            label_model: "gemini-2.0-flash-001".into(),
            analysis_model: "gemini-2.5-pro".into(),
            tagging_model: "gemini-2.5-flash".into(),
            timeout_secs: 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl GeminiConfig {
    /// Build a config from `GEMINI_API_KEY`, failing when it is unset or blank.
    pub fn from_env() -> Result<Self, ServiceError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ServiceError::MissingCredentials)?;
        Ok(Self {
            api_key,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_public_endpoint() {
        let cfg = GeminiConfig::default();
        assert!(cfg.base_url.starts_with("https://generativelanguage"));
        assert!(cfg.api_key.is_empty());
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = GeminiConfig {
            api_key: "k".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: GeminiConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
