//! Gavel CLI: one business in, a three-line verdict out.
//!
//! The binary is a thin caller of the runtime pipeline. It resolves the
//! business id (accepting a full business-page URL for convenience), builds
//! the backends from the environment, and prints the verdict.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use gavel_runtime::{
    BusinessId, GeminiProvider, Pipeline, RuntimeConfig, YelpDirectory,
};

#[derive(Parser, Debug)]
#[command(name = "gavel", version, about = "Three-line business verdicts from a three-agent debate")]
struct Cli {
    /// Business id, or a business-page URL to extract it from
    business: String,

    /// Emit the full evaluation (verdict, evidence kind, usage) as JSON
    #[arg(long)]
    json: bool,

    /// Path to a JSON runtime configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the generation model
    #[arg(long)]
    model: Option<String>,
}

/// Accept either a bare id or a business-page URL (`.../biz/<id>?...`).
fn business_id_from_arg(arg: &str) -> BusinessId {
    if let Some(tail) = arg.split("/biz/").nth(1) {
        let slug = tail
            .split(['?', '#', '/'])
            .next()
            .unwrap_or(tail);
        return BusinessId::new(slug);
    }
    BusinessId::new(arg.trim())
}

fn load_config(cli: &Cli) -> anyhow::Result<RuntimeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => RuntimeConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let id = business_id_from_arg(&cli.business);

    let provider = Arc::new(GeminiProvider::from_env().context("configuring generation backend")?);
    let directory = Arc::new(YelpDirectory::from_env().context("configuring business directory")?);

    let pipeline = Pipeline::builder()
        .provider(provider)
        .directory(directory)
        .config(config)
        .build()
        .context("building pipeline")?;

    let evaluation = pipeline.evaluate(&id).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!("{}", evaluation.verdict.render());
    }

    Ok(())
}
