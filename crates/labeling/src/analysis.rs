//! Whole-corpus thematic analysis and the tagging pass that follows it.
//!
//! Instead of clustering embeddings, this path hands the entire corpus to a
//! large-context model in one prompt and asks for a researcher-style theme
//! breakdown. A second, cheaper model then tags each comment with its
//! primary theme so segment breakdowns can be computed.

use std::sync::Arc;
use std::time::Duration;

use gemini::{with_retry, GenerativeService, ModelRole, RetryPolicy, ServiceError};
use serde::{Deserialize, Serialize};

/// Comments per tagging request.
const TAG_BATCH_SIZE: usize = 200;
/// Pause between tagging batches.
const TAG_BATCH_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedTheme {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThematicAnalysis {
    pub themes: Vec<AnalyzedTheme>,
    #[serde(default)]
    pub total_analyzed: usize,
}

pub struct ThematicAnalyzer {
    service: Arc<dyn GenerativeService>,
    retry: RetryPolicy,
}

/// Pull the JSON payload out of a response that may wrap it in a fenced
/// code block.
fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    for fence in ["```json", "```"] {
        if let Some(after) = trimmed.split_once(fence).map(|(_, rest)| rest) {
            if let Some((inner, _)) = after.split_once("```") {
                return inner.trim();
            }
        }
    }
    trimmed
}

fn analysis_prompt(texts: &[String]) -> String {
    let numbered: Vec<String> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t.trim()))
        .collect();

    format!(
        "You are a senior qualitative research analyst hired by a university's parking department.\n\
         \n\
         Below are {n} free-text survey responses from students about their parking experience.\n\
         Your task: perform a rigorous thematic analysis and identify the key themes.\n\
         \n\
         IMPORTANT RULES:\n\
         - Identify 5-8 distinct themes (not too few, not too many)\n\
         - Themes must be MUTUALLY DISTINCT — no overlapping concepts\n\
         - Each theme needs a short actionable label (2-4 words, like \"Reduce Permit Costs\" or \"Closer Student Lots\")\n\
         - For each theme, count how many comments relate to it (a comment can count in multiple themes)\n\
         - For each theme, pick the 5 most representative VERBATIM quotes — they must be EXACT text from the list below\n\
         - Also provide a 1-2 sentence insight/summary for each theme\n\
         \n\
         Respond with this JSON schema:\n\
         {{\n\
           \"themes\": [\n\
             {{\n\
               \"label\": \"Theme Label\",\n\
               \"description\": \"1-2 sentence insight about this theme\",\n\
               \"count\": 123,\n\
               \"quotes\": [\"exact quote 1\", \"exact quote 2\", \"exact quote 3\", \"exact quote 4\", \"exact quote 5\"]\n\
             }}\n\
           ],\n\
           \"total_analyzed\": {n}\n\
         }}\n\
         \n\
         ORDER themes by count descending (most common first).\n\
         \n\
         STUDENT RESPONSES:\n\
         {responses}",
        n = texts.len(),
        responses = numbered.join("\n")
    )
}

fn tagging_prompt(batch: &[String], labels: &[String]) -> String {
    let labels_list: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("  {}. {}", i + 1, label))
        .collect();
    let numbered: Vec<String> = batch
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t.trim()))
        .collect();

    format!(
        "For each comment below, reply with ONLY the number of its best-matching theme.\n\
         \n\
         Themes:\n\
         {labels}\n\
         \n\
         Comments:\n\
         {comments}\n\
         \n\
         Reply with {count} lines, each containing ONLY a theme number (1-{max}). No other text.",
        labels = labels_list.join("\n"),
        comments = numbered.join("\n"),
        count = batch.len(),
        max = labels.len()
    )
}

/// Parse tagging output: a JSON array of numbers, a `{"tags": [...]}` object,
/// or plain newline-separated digits.
fn parse_tag_numbers(response: &str) -> Vec<usize> {
    let cleaned = strip_fences(response);
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) {
        let array = match &value {
            serde_json::Value::Array(items) => Some(items.clone()),
            serde_json::Value::Object(map) => map.get("tags").and_then(|v| v.as_array()).cloned(),
            _ => None,
        };
        if let Some(items) = array {
            return items
                .iter()
                .filter_map(|v| v.as_u64().map(|n| n as usize))
                .collect();
        }
    }
    cleaned
        .lines()
        .filter_map(|line| {
            let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<usize>().ok()
        })
        .collect()
}

impl ThematicAnalyzer {
    pub fn new(service: Arc<dyn GenerativeService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// One-shot thematic analysis over the whole corpus. Unlike the other
    /// stages this one has no local fallback, so parse failures surface.
    pub async fn analyze(&self, texts: &[String]) -> Result<ThematicAnalysis, ServiceError> {
        let prompt = analysis_prompt(texts);
        tracing::info!(texts = texts.len(), "running whole-corpus thematic analysis");
        let response = with_retry(&self.retry, |_| {
            self.service.generate_json(ModelRole::Analysis, &prompt)
        })
        .await?;

        let analysis: ThematicAnalysis = serde_json::from_str(strip_fences(&response))
            .map_err(|e| ServiceError::Parse(format!("thematic analysis response: {e}")))?;
        if analysis.themes.is_empty() {
            return Err(ServiceError::Parse(
                "thematic analysis returned no themes".into(),
            ));
        }
        Ok(analysis)
    }

    /// Tag every comment with the label of its best-matching theme. A batch
    /// that fails or a tag that is out of range falls back to the first
    /// (most common) theme.
    pub async fn tag(&self, texts: &[String], labels: &[String]) -> Vec<String> {
        if labels.is_empty() {
            return Vec::new();
        }

        let mut tags = Vec::with_capacity(texts.len());
        let mut batches = texts.chunks(TAG_BATCH_SIZE).peekable();
        while let Some(batch) = batches.next() {
            let prompt = tagging_prompt(batch, labels);
            let response = with_retry(&self.retry, |_| {
                self.service.generate(ModelRole::Tagging, &prompt)
            })
            .await;

            match response {
                Ok(text) => {
                    let numbers = parse_tag_numbers(&text);
                    for i in 0..batch.len() {
                        let label = numbers
                            .get(i)
                            .and_then(|&n| n.checked_sub(1))
                            .and_then(|idx| labels.get(idx))
                            .unwrap_or(&labels[0]);
                        tags.push(label.clone());
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "tagging batch failed, defaulting to first theme");
                    tags.extend(std::iter::repeat(labels[0].clone()).take(batch.len()));
                }
            }
            if batches.peek().is_some() {
                tokio::time::sleep(TAG_BATCH_DELAY).await;
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Fixed(Result<String, ServiceError>);

    #[async_trait]
    impl GenerativeService for Fixed {
        async fn generate(&self, _role: ModelRole, _prompt: &str) -> Result<String, ServiceError> {
            self.0.clone()
        }

        async fn generate_json(
            &self,
            role: ModelRole,
            prompt: &str,
        ) -> Result<String, ServiceError> {
            self.generate(role, prompt).await
        }
    }

    fn analyzer(response: Result<String, ServiceError>) -> ThematicAnalyzer {
        let retry = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(false);
        ThematicAnalyzer::new(Arc::new(Fixed(response)), retry)
    }

    fn sample_analysis() -> String {
        serde_json::json!({
            "themes": [
                {"label": "Lower Costs", "description": "Permits cost too much.",
                 "count": 40, "quotes": ["too expensive"]},
                {"label": "Closer Parking", "description": "Lots are far away.",
                 "count": 25, "quotes": ["so far from class"]}
            ],
            "total_analyzed": 65
        })
        .to_string()
    }

    #[test]
    fn strips_json_fences() {
        let fenced = format!("```json\n{}\n```", sample_analysis());
        let parsed: ThematicAnalysis = serde_json::from_str(strip_fences(&fenced)).unwrap();
        assert_eq!(parsed.themes.len(), 2);
    }

    #[test]
    fn strips_bare_fences() {
        let fenced = "```\n[1,2,3]\n```";
        assert_eq!(strip_fences(fenced), "[1,2,3]");
    }

    #[test]
    fn parses_tag_formats() {
        assert_eq!(parse_tag_numbers("[1, 2, 1]"), vec![1, 2, 1]);
        assert_eq!(parse_tag_numbers("{\"tags\": [3, 1]}"), vec![3, 1]);
        assert_eq!(parse_tag_numbers("1\n2.\n 3"), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn analyze_parses_a_clean_response() {
        let analyzer = analyzer(Ok(sample_analysis()));
        let texts = vec!["a".to_string(); 65];
        let result = analyzer.analyze(&texts).await.unwrap();
        assert_eq!(result.themes[0].label, "Lower Costs");
        assert_eq!(result.total_analyzed, 65);
    }

    #[tokio::test]
    async fn analyze_rejects_garbage() {
        let analyzer = analyzer(Ok("not json at all".into()));
        let texts = vec!["a".to_string()];
        let err = analyzer.analyze(&texts).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[tokio::test]
    async fn analyze_rejects_empty_theme_list() {
        let analyzer = analyzer(Ok("{\"themes\": [], \"total_analyzed\": 0}".into()));
        let err = analyzer.analyze(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[tokio::test]
    async fn tags_map_numbers_to_labels() {
        let analyzer = analyzer(Ok("[2, 1, 2]".into()));
        let texts: Vec<String> = (0..3).map(|i| format!("comment {i}")).collect();
        let labels = vec!["First".to_string(), "Second".to_string()];
        let tags = analyzer.tag(&texts, &labels).await;
        assert_eq!(tags, vec!["Second", "First", "Second"]);
    }

    #[tokio::test]
    async fn out_of_range_tags_default_to_first_theme() {
        let analyzer = analyzer(Ok("[9, 0, 2]".into()));
        let texts: Vec<String> = (0..3).map(|i| format!("comment {i}")).collect();
        let labels = vec!["First".to_string(), "Second".to_string()];
        let tags = analyzer.tag(&texts, &labels).await;
        assert_eq!(tags, vec!["First", "First", "Second"]);
    }

    #[tokio::test]
    async fn failed_batch_defaults_everything_to_first_theme() {
        let analyzer = analyzer(Err(ServiceError::Permanent {
            status: 500,
            message: "down".into(),
        }));
        let texts: Vec<String> = (0..4).map(|i| format!("comment {i}")).collect();
        let labels = vec!["First".to_string(), "Second".to_string()];
        let tags = analyzer.tag(&texts, &labels).await;
        assert_eq!(tags, vec!["First"; 4]);
    }
}
