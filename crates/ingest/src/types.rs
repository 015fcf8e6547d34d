//! Data model for survey responses and selected text documents.
//!
//! `ResponseRecord` mirrors one row of the cleaned survey export. The text
//! selector reduces records to `TextDocument`s, which are what the rest of
//! the pipeline operates on: every document carries non-empty substantive
//! text plus the categorical covariates used for segment breakdowns.

use serde::{Deserialize, Deserializer, Serialize};

/// One survey submission as loaded from the cleaned tabular export.
///
/// Immutable once loaded. Missing columns deserialize to empty strings
/// (or `false` for the skip flag) rather than erroring, since upstream
/// exports vary in which optional columns they include.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseRecord {
    #[serde(default)]
    pub id: String,
    /// Primary free-text field ("what would improve parking?").
    #[serde(default)]
    pub suggestion: String,
    /// Secondary free-text field (skipped-class experience).
    #[serde(default)]
    pub skip_experience: String,
    #[serde(default)]
    pub arrival_time: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub skipped_class: bool,
}

/// Which free-text field a document's text was taken from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Suggestion,
    Experience,
}

/// Categorical covariates carried along for segment tallies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Covariates {
    pub arrival_time: String,
    pub mode: String,
    pub frequency: String,
    pub skipped_class: bool,
}

/// A substantive response: non-empty text over the minimum length threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextDocument {
    pub id: String,
    pub text: String,
    pub source: TextSource,
    pub covariates: Covariates,
}

impl ResponseRecord {
    pub fn covariates(&self) -> Covariates {
        Covariates {
            arrival_time: self.arrival_time.clone(),
            mode: self.mode.clone(),
            frequency: self.frequency.clone(),
            skipped_class: self.skipped_class,
        }
    }
}

/// Accept `true`/`false`, `True`/`False`, `1`/`0`, `yes`/`no`, and blank.
/// Survey exports are not consistent about boolean encoding.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        // CSV cells holding bare digits come through as integers.
        Int(i64),
        Text(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Int(n) => Ok(n != 0),
        BoolOrString::Text(s) => Ok(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariates_copy_record_fields() {
        let record = ResponseRecord {
            id: "r1".into(),
            arrival_time: "8-10 AM".into(),
            mode: "Drive alone".into(),
            frequency: "Daily".into(),
            skipped_class: true,
            ..Default::default()
        };
        let cov = record.covariates();
        assert_eq!(cov.arrival_time, "8-10 AM");
        assert_eq!(cov.mode, "Drive alone");
        assert_eq!(cov.frequency, "Daily");
        assert!(cov.skipped_class);
    }

    #[test]
    fn flexible_bool_accepts_export_variants() {
        for (raw, expected) in [
            ("true", true),
            ("True", true),
            ("1", true),
            ("yes", true),
            ("false", false),
            ("False", false),
            ("0", false),
            ("", false),
        ] {
            let json = format!(r#"{{"id":"x","skipped_class":"{raw}"}}"#);
            let record: ResponseRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.skipped_class, expected, "raw value {raw:?}");
        }

        let record: ResponseRecord = serde_json::from_str(r#"{"skipped_class":true}"#).unwrap();
        assert!(record.skipped_class);
    }

    #[test]
    fn text_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TextSource::Suggestion).unwrap(),
            "\"suggestion\""
        );
        assert_eq!(
            serde_json::to_string(&TextSource::Experience).unwrap(),
            "\"experience\""
        );
    }
}
