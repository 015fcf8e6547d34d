use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::GeminiConfig;
use crate::error::{classify_status, ServiceError};
use crate::service::{EmbeddingService, GenerativeService, ModelRole, TaskType};

/// reqwest-backed client for the Gemini REST API.
///
/// One instance owns a pooled HTTP client and serves both the embedding and
/// the generative endpoints. Retries are not handled here; call sites wrap
/// requests in [`with_retry`](crate::with_retry).
pub struct GeminiClient {
    http: reqwest::Client,
    cfg: GeminiConfig,
}

impl GeminiClient {
    pub fn new(cfg: GeminiConfig) -> Result<Self, ServiceError> {
        if cfg.api_key.is_empty() {
            return Err(ServiceError::MissingCredentials);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.cfg
    }

    fn model_for(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Label | ModelRole::Rerank => &self.cfg.label_model,
            ModelRole::Analysis => &self.cfg.analysis_model,
            ModelRole::Tagging => &self.cfg.tagging_model,
        }
    }

    fn endpoint(&self, model: &str, verb: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.cfg.base_url, model, verb, self.cfg.api_key
        )
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<Value, ServiceError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Transient(format!("request timed out: {e}"))
                } else {
                    ServiceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceError::Parse(format!("invalid JSON response: {e}")))
    }

    async fn generate_with(
        &self,
        role: ModelRole,
        prompt: &str,
        structured: bool,
    ) -> Result<String, ServiceError> {
        let mut payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if structured {
            payload["generationConfig"] = json!({
                "temperature": 0.2,
                "responseMimeType": "application/json",
            });
        }

        let url = self.endpoint(self.model_for(role), "generateContent");
        let value = self.post(&url, &payload).await?;
        value
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ServiceError::Parse("response contains no candidate text".into()))
    }
}

#[async_trait]
impl EmbeddingService for GeminiClient {
    async fn embed_batch(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model_ref = format!("models/{}", self.cfg.embed_model);
        let payload = json!({
            "requests": texts
                .iter()
                .map(|text| json!({
                    "model": model_ref,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": task.as_str(),
                }))
                .collect::<Vec<_>>(),
        });

        let url = self.endpoint(&self.cfg.embed_model, "batchEmbedContents");
        let value = self.post(&url, &payload).await?;
        let embeddings = value
            .get("embeddings")
            .and_then(Value::as_array)
            .ok_or_else(|| ServiceError::Parse("response missing `embeddings` array".into()))?;

        let vectors = embeddings
            .iter()
            .map(|entry| parse_values(entry.get("values")))
            .collect::<Result<Vec<_>, _>>()?;

        if vectors.len() != texts.len() {
            return Err(ServiceError::Parse(format!(
                "service returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    async fn embed_one(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ServiceError> {
        let payload = json!({
            "model": format!("models/{}", self.cfg.embed_model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task.as_str(),
        });

        let url = self.endpoint(&self.cfg.embed_model, "embedContent");
        let value = self.post(&url, &payload).await?;
        parse_values(value.pointer("/embedding/values"))
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate(&self, role: ModelRole, prompt: &str) -> Result<String, ServiceError> {
        self.generate_with(role, prompt, false).await
    }

    async fn generate_json(&self, role: ModelRole, prompt: &str) -> Result<String, ServiceError> {
        self.generate_with(role, prompt, true).await
    }
}

fn parse_values(value: Option<&Value>) -> Result<Vec<f32>, ServiceError> {
    let values = value
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::Parse("embedding entry missing `values` array".into()))?;
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| ServiceError::Parse("non-numeric embedding value".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_missing_credentials() {
        let result = GeminiClient::new(GeminiConfig::default());
        assert!(matches!(result, Err(ServiceError::MissingCredentials)));
    }

    #[test]
    fn endpoint_shape() {
        let c = client();
        let url = c.endpoint("gemini-embedding-001", "batchEmbedContents");
        assert!(url.contains("/models/gemini-embedding-001:batchEmbedContents?key=test-key"));
    }

    #[test]
    fn model_routing_by_role() {
        let c = client();
        assert_eq!(c.model_for(ModelRole::Label), "gemini-2.0-flash-001");
        assert_eq!(c.model_for(ModelRole::Rerank), "gemini-2.0-flash-001");
        assert_eq!(c.model_for(ModelRole::Analysis), "gemini-2.5-pro");
        assert_eq!(c.model_for(ModelRole::Tagging), "gemini-2.5-flash");
    }

    #[test]
    fn parse_values_accepts_numbers() {
        let value = json!({ "values": [0.25, -1.5, 3.0] });
        let parsed = parse_values(value.get("values")).unwrap();
        assert_eq!(parsed, vec![0.25, -1.5, 3.0]);
    }

    #[test]
    fn parse_values_rejects_non_numbers() {
        let value = json!({ "values": [0.25, "oops"] });
        assert!(parse_values(value.get("values")).is_err());
        assert!(parse_values(None).is_err());
    }
}
