//! Writing the themes.json artifact.

use std::path::Path;

use thiserror::Error;

use crate::theme::ThemeReport;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize the report as pretty-printed JSON, creating parent directories
/// as needed.
pub fn write_report<P: AsRef<Path>>(path: P, report: &ThemeReport) -> Result<(), ThemeError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), themes = report.themes.len(), "wrote theme report");
    Ok(())
}
