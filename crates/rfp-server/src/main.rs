//! RFP/RFI pipeline API server binary.
//!
//! Starts an HTTP server exposing `rfp-core`'s pipeline as a thin trigger
//! surface: project/document CRUD, file upload/download, and the
//! `generate-full` run trigger. The pipeline itself runs as a background
//! task on this same process.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rfp_core::blob::minio::MinioStore;
use rfp_core::config::Config;
use rfp_core::embedding::voyage::VoyageProvider;
use rfp_core::llm::anthropic::AnthropicProvider;
use rfp_core::storage;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use rfp_server::state::AppState;

/// RFP/RFI pipeline API server.
#[derive(Parser)]
#[command(name = "rfp-server", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "8088")]
    port: u16,

    /// Host address to bind to. Use 0.0.0.0 for LAN access.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path to the pipeline configuration file.
    #[arg(long, default_value = "~/.rfp-pipeline/config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!("Failed to load configuration: {e}\nHint: Run 'rfp init' to create a default configuration file.")
    })?;

    tracing::info!(db = %config.storage.db_path, host = %cli.host, port = cli.port, "starting rfp-server");

    let pool = storage::init_db(&config.storage.db_path).await?;

    let llm_key = config.llm.api_key.clone().context("no LLM API key configured")?;
    let embedding_key = config.embedding.api_key.clone().context("no embedding API key configured")?;
    let (access_key, secret_key) = config
        .blob
        .access_key
        .clone()
        .zip(config.blob.secret_key.clone())
        .context("no blob store credentials configured")?;

    let llm = Arc::new(AnthropicProvider::new(llm_key, config.llm.model.clone()));
    let embedder = Arc::new(VoyageProvider::new(embedding_key, config.embedding.model.clone(), config.embedding.dimension));
    let blob = Arc::new(MinioStore::new(
        config.blob.endpoint.clone(),
        access_key,
        secret_key,
        config.blob.bucket.clone(),
        config.blob.secure,
    ));

    let state = Arc::new(AppState {
        db: pool,
        llm,
        embedder,
        blob,
        config,
        in_flight: Mutex::new(HashSet::new()),
    });

    let router = rfp_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", cli.host, cli.port)).await?;
    tracing::info!("listening on http://{}:{}", cli.host, cli.port);
    axum::serve(listener, router).await?;

    Ok(())
}
