use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use themescope::{
    load_responses, run_pipeline, select_documents, write_report, ClusteringThemeBuilder,
    GeminiClient, GeminiConfig, GenerativeThemeBuilder, PipelineConfig, StubService, ThemeBuilder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Embedding + k-means clustering.
    Cluster,
    /// Whole-corpus generative thematic analysis.
    Llm,
}

/// Build a themes.json artifact from a cleaned survey CSV.
#[derive(Debug, Parser)]
#[command(name = "themescope", version, about)]
struct Cli {
    /// Path to the cleaned survey CSV.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path for themes.json.
    #[arg(short, long)]
    output: PathBuf,

    /// Optional YAML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed cluster count; 0 selects k automatically by silhouette.
    #[arg(short = 'k', long = "clusters", default_value_t = 0)]
    clusters: usize,

    /// Quotes per theme.
    #[arg(short, long, default_value_t = 5, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    quotes: usize,

    /// Analysis method.
    #[arg(short, long, value_enum, default_value_t = Method::Cluster)]
    method: Method,

    /// Run offline against deterministic stub embeddings (no API key
    /// needed; labels and quotes use local fallbacks).
    #[arg(long)]
    offline: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.report.quotes_per_theme = cli.quotes;

    let records = load_responses(&cli.input)
        .with_context(|| format!("loading responses from {}", cli.input.display()))?;
    let documents = select_documents(&records, &config.select.to_select_config());

    let fixed_k = (cli.clusters > 0).then_some(cli.clusters);
    let input_file = cli.input.display().to_string();

    let report = if cli.offline {
        let stub = Arc::new(StubService::default());
        let builder = ClusteringThemeBuilder::new(
            stub.clone(),
            stub,
            &config,
            fixed_k,
            "stub-embedding".to_string(),
        );
        run_pipeline(&documents, &builder, &input_file).await?
    } else {
        let gemini_config = GeminiConfig::from_env()?;
        let embed_model = gemini_config.embed_model.clone();
        let analysis_model = gemini_config.analysis_model.clone();
        let client = Arc::new(GeminiClient::new(gemini_config)?);

        let builder: Box<dyn ThemeBuilder> = match cli.method {
            Method::Cluster => Box::new(ClusteringThemeBuilder::new(
                client.clone(),
                client,
                &config,
                fixed_k,
                embed_model,
            )),
            Method::Llm => Box::new(GenerativeThemeBuilder::new(client, &config, analysis_model)),
        };
        run_pipeline(&documents, builder.as_ref(), &input_file).await?
    };

    for theme in &report.themes {
        tracing::info!(
            label = %theme.label,
            count = theme.count,
            pct = theme.pct,
            degraded = theme.degraded,
            "theme"
        );
    }

    write_report(&cli.output, &report)?;
    tracing::info!(path = %cli.output.display(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quotes_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "themescope", "-i", "clean.csv", "-o", "themes.json", "--quotes", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn positive_quotes_parse() {
        let cli = Cli::try_parse_from([
            "themescope", "-i", "clean.csv", "-o", "themes.json", "--quotes", "3",
        ])
        .unwrap();
        assert_eq!(cli.quotes, 3);
    }
}
