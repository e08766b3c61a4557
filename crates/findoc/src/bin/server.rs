//! Analysis server binary
//!
//! Run with: cargo run -p findoc --bin findoc-server -- --config config.toml

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use findoc::{
    analysis::{AnalysisPipeline, LlmAnalysisEngine},
    config::AnalyzerConfig,
    ingestion::FileExtractor,
    providers::build_llm,
    server::{state::AppState, AnalyzerServer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "findoc-server", version, about = "Financial document analysis API")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "findoc=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = args
        .config
        .or_else(|| AnalyzerConfig::default_path().filter(|p| p.exists()));
    let mut config = match &config_path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            AnalyzerConfig::load(path)?
        }
        None => AnalyzerConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM: {:?} {} at {}", config.llm.provider, config.llm.model, config.llm.base_url);
    tracing::info!("  - Data directory: {}", config.storage.data_dir.display());
    tracing::info!("  - Max chars: {}", config.processing.max_chars);
    tracing::info!("  - Workers: {}", config.processing.workers);

    let llm = build_llm(&config.llm)?;
    match llm.health_check().await {
        Ok(true) => tracing::info!("LLM endpoint is reachable"),
        _ => tracing::warn!(
            "LLM endpoint not available at {}; jobs will fail until it is",
            config.llm.base_url
        ),
    }

    // One engine for the whole process
    let engine = Arc::new(LlmAnalysisEngine::new(llm, AnalysisPipeline::financial()));
    let state = AppState::with_engine(config, engine, Arc::new(FileExtractor::default())).await?;
    let server = AnalyzerServer::with_state(state);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /analyze          - Submit a document and query");
    println!("  GET  /status/:job_id   - Poll job status");
    println!("  GET  /jobs             - List recent jobs");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
